use crate::{
    counter::{CounterInfo, JumpInfo, JumpState, SitupInfo, Stage},
    landmarks::{LandmarkSet, POSE_CONNECTIONS},
};

pub const SKELETON_LINE_THICKNESS: i32 = 3;
const MIN_DRAW_VISIBILITY: f32 = 0.5;
const PANEL_ALPHA: f32 = 0.7;
const PANEL_COLOR: [u8; 4] = [29, 29, 29, 255];
const GUIDE_LINE_THICKNESS: i32 = 2;

/// Draws landmarks and counter state over an RGBA8 frame.
pub fn render(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    landmarks: Option<&LandmarkSet>,
    info: &CounterInfo,
) {
    match info {
        CounterInfo::Situp(info) => draw_situp_panel(buffer, width, height, info),
        CounterInfo::Jump(info) => draw_jump_panel(buffer, width, height, info),
    }

    if let Some(landmarks) = landmarks {
        draw_skeleton(buffer, width, height, landmarks);
    }

    if let CounterInfo::Jump(JumpInfo {
        crouch_threshold: Some(threshold),
        ..
    }) = info
    {
        let y = *threshold;
        draw_line(
            buffer,
            width,
            height,
            &(0.0, y),
            &(width as f32, y),
            [255, 0, 0, 255],
            GUIDE_LINE_THICKNESS,
        );
    }
}

pub fn draw_skeleton(buffer: &mut [u8], width: u32, height: u32, landmarks: &LandmarkSet) {
    let projected = landmarks.project(width, height);
    if projected.len() < 2 {
        return;
    }
    let position = |which| {
        projected
            .iter()
            .find(|(lm, _, visibility)| *lm == which && *visibility >= MIN_DRAW_VISIBILITY)
            .map(|(_, pos, _)| *pos)
    };

    let line_color = [245u8, 245u8, 245u8, 255u8];
    for &(a, b) in POSE_CONNECTIONS {
        if let (Some(pa), Some(pb)) = (position(a), position(b)) {
            draw_line(
                buffer,
                width,
                height,
                &pa,
                &pb,
                line_color,
                SKELETON_LINE_THICKNESS,
            );
        }
    }

    let point_color = [248u8, 113u8, 113u8, 255u8];
    let point_radius = SKELETON_LINE_THICKNESS + 1;
    for &(_, (x, y), visibility) in &projected {
        if visibility < MIN_DRAW_VISIBILITY {
            continue;
        }
        draw_circle(
            buffer,
            width,
            height,
            (x as i32, y as i32),
            point_radius,
            point_color,
        );
    }
}

const LABEL_COLOR: [u8; 4] = [200, 200, 200, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const LABEL_CELL: i32 = 2;

fn draw_situp_panel(buffer: &mut [u8], width: u32, height: u32, info: &SitupInfo) {
    fill_rect_blended(buffer, width, height, (20, 20), (220, 130), PANEL_COLOR, PANEL_ALPHA);
    draw_text(buffer, width, height, (40, 28), "REPS", LABEL_CELL, LABEL_COLOR);
    draw_text(buffer, width, height, (40, 40), &info.count.to_string(), 12, WHITE);

    let stage_color = match info.stage {
        Stage::Up => [34u8, 197u8, 94u8, 255u8],
        Stage::Down => [249u8, 115u8, 22u8, 255u8],
    };
    draw_text(buffer, width, height, (150, 28), "STAGE", LABEL_CELL, LABEL_COLOR);
    fill_rect_blended(buffer, width, height, (160, 40), (200, 110), stage_color, 1.0);
    draw_text(buffer, width, height, (150, 114), info.stage.label(), LABEL_CELL, WHITE);
}

fn draw_jump_panel(buffer: &mut [u8], width: u32, height: u32, info: &JumpInfo) {
    fill_rect_blended(buffer, width, height, (20, 20), (340, 160), PANEL_COLOR, PANEL_ALPHA);
    draw_text(buffer, width, height, (40, 32), "JUMP COUNT", LABEL_CELL, LABEL_COLOR);
    draw_text(buffer, width, height, (45, 50), &info.count.to_string(), 14, WHITE);
    draw_text(buffer, width, height, (160, 32), "LAST JUMP (CM)", LABEL_CELL, LABEL_COLOR);
    draw_text(
        buffer,
        width,
        height,
        (165, 70),
        &format!("{:.1}", info.last_jump_cm.max(0.0)),
        10,
        WHITE,
    );

    let (bar_color, text_color) = match info.state {
        JumpState::Jumping => ([0u8, 255u8, 0u8, 255u8], WHITE),
        JumpState::Calibrating => ([255u8, 255u8, 0u8, 255u8], [0u8, 0u8, 0u8, 255u8]),
        JumpState::Idle | JumpState::Crouching => (PANEL_COLOR, WHITE),
    };
    let (w, h) = (width as i32, height as i32);
    fill_rect_blended(buffer, width, height, (20, h - 70), (w - 20, h - 20), bar_color, PANEL_ALPHA);

    let chars = info.feedback.chars().count() as i32;
    if chars == 0 {
        return;
    }
    let cell = ((w - 60) / (chars * GLYPH_ADVANCE)).clamp(1, 4);
    let text_w = text_width(&info.feedback, cell);
    let origin = ((w - text_w) / 2, h - 70 + (50 - GLYPH_ROWS * cell) / 2);
    draw_text(buffer, width, height, origin, &info.feedback, cell, text_color);
}

const GLYPH_ROWS: i32 = 5;
const GLYPH_ADVANCE: i32 = 4;

/// 3x5 glyphs, one row per entry, most significant of the low three bits on the left.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

const LETTER_GLYPHS: [[u8; 5]; 26] = [
    [0b010, 0b101, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b110, 0b101, 0b110],
    [0b011, 0b100, 0b100, 0b100, 0b011],
    [0b110, 0b101, 0b101, 0b101, 0b110],
    [0b111, 0b100, 0b110, 0b100, 0b111],
    [0b111, 0b100, 0b110, 0b100, 0b100],
    [0b011, 0b100, 0b101, 0b101, 0b011],
    [0b101, 0b101, 0b111, 0b101, 0b101],
    [0b111, 0b010, 0b010, 0b010, 0b111],
    [0b001, 0b001, 0b001, 0b101, 0b010],
    [0b101, 0b101, 0b110, 0b101, 0b101],
    [0b100, 0b100, 0b100, 0b100, 0b111],
    [0b101, 0b111, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b101, 0b101, 0b101],
    [0b010, 0b101, 0b101, 0b101, 0b010],
    [0b110, 0b101, 0b110, 0b100, 0b100],
    [0b010, 0b101, 0b101, 0b110, 0b011],
    [0b110, 0b101, 0b110, 0b101, 0b101],
    [0b011, 0b100, 0b010, 0b001, 0b110],
    [0b111, 0b010, 0b010, 0b010, 0b010],
    [0b101, 0b101, 0b101, 0b101, 0b111],
    [0b101, 0b101, 0b101, 0b101, 0b010],
    [0b101, 0b101, 0b111, 0b111, 0b101],
    [0b101, 0b101, 0b010, 0b101, 0b101],
    [0b101, 0b101, 0b010, 0b010, 0b010],
    [0b111, 0b001, 0b010, 0b100, 0b111],
];

fn glyph(ch: char) -> Option<[u8; 5]> {
    let ch = ch.to_ascii_uppercase();
    Some(match ch {
        '0'..='9' => DIGIT_GLYPHS[(ch as u8 - b'0') as usize],
        'A'..='Z' => LETTER_GLYPHS[(ch as u8 - b'A') as usize],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => return None,
    })
}

fn text_width(text: &str, cell: i32) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        0
    } else {
        (chars * GLYPH_ADVANCE - 1) * cell
    }
}

/// Draws `text` in upper case with the built-in 3x5 font, each font pixel
/// `cell` screen pixels wide. Characters without a glyph leave a blank cell.
pub fn draw_text(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    origin: (i32, i32),
    text: &str,
    cell: i32,
    color: [u8; 4],
) {
    let mut cursor = origin.0;
    for ch in text.chars() {
        if let Some(glyph) = glyph(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    let x = cursor + col * cell;
                    let y = origin.1 + row as i32 * cell;
                    fill_rect_blended(buffer, width, height, (x, y), (x + cell, y + cell), color, 1.0);
                }
            }
        }
        cursor += GLYPH_ADVANCE * cell;
    }
}

fn fill_rect_blended(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    top_left: (i32, i32),
    bottom_right: (i32, i32),
    color: [u8; 4],
    alpha: f32,
) {
    let x0 = top_left.0.max(0);
    let y0 = top_left.1.max(0);
    let x1 = bottom_right.0.min(width as i32);
    let y1 = bottom_right.1.min(height as i32);
    let alpha = alpha.clamp(0.0, 1.0);

    for y in y0..y1 {
        for x in x0..x1 {
            let idx = ((y as u32 * width + x as u32) as usize) * 4;
            if idx + 3 >= buffer.len() {
                continue;
            }
            for c in 0..3 {
                let under = buffer[idx + c] as f32;
                buffer[idx + c] = (alpha * color[c] as f32 + (1.0 - alpha) * under).round() as u8;
            }
            buffer[idx + 3] = 255;
        }
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: &(f32, f32),
    p1: &(f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel_safe(buffer, width, height, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox.abs() + oy.abs() <= radius && (ox, oy) != (0, 0) {
                        put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: [u8; 4],
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}
