use macroquad::prelude::*;

use trackpilot::car::CarAgent;
use trackpilot::observer::TickFrame;
use trackpilot::stats::FitnessHistory;

const BG_COLOR: Color = Color::new(0.02, 0.03, 0.08, 1.0);
const CAR_COLOR: Color = Color::new(0.95, 0.55, 0.15, 1.0);
const RADAR_COLOR: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// Camera that fits the whole track into the window, y pointing down.
fn track_camera(track: &Texture2D) -> Camera2D {
    let (tw, th) = (track.width(), track.height());
    let zoom = (screen_width() / tw).min(screen_height() / th);
    Camera2D {
        target: vec2(tw * 0.5, th * 0.5),
        zoom: vec2(zoom / screen_width() * 2.0, -zoom / screen_height() * 2.0),
        ..Default::default()
    }
}

/// Draw the track, every live car with its radars, and the HUD.
pub fn draw(frame: &TickFrame<'_>, track: &Texture2D, history: &FitnessHistory) {
    clear_background(BG_COLOR);

    set_camera(&track_camera(track));
    draw_texture(track, 0.0, 0.0, WHITE);
    for (_id, car) in frame.iter_alive() {
        draw_radars(car);
        draw_car(car);
    }

    set_default_camera();
    draw_overlay(frame.generation, frame.alive, frame.tick);
    draw_history(history);
}

fn draw_car(car: &CarAgent) {
    let [a, b, c, d] = *car.corners();
    draw_triangle(a, b, c, CAR_COLOR);
    draw_triangle(a, c, d, CAR_COLOR);

    // Nose marker along the heading.
    let nose = car.center() + trackpilot::radar::heading_vector(car.angle()) * 20.0;
    draw_circle(nose.x, nose.y, 4.0, WHITE);
}

fn draw_radars(car: &CarAgent) {
    let center = car.center();
    for hit in car.radars() {
        let (x, y) = (hit.point.0 as f32, hit.point.1 as f32);
        draw_line(center.x, center.y, x, y, 1.0, RADAR_COLOR);
        draw_circle(x, y, 5.0, RADAR_COLOR);
    }
}

fn draw_centered_text(text: &str, y: f32, size: u16) {
    let tw = measure_text(text, None, size, 1.0).width;
    let x = screen_width() * 0.5 - tw * 0.5;
    draw_text(text, x + 1.0, y + 1.0, size as f32, Color::new(0.0, 0.0, 0.0, 0.5));
    draw_text(text, x, y, size as f32, WHITE);
}

fn draw_overlay(generation: u64, alive: usize, tick: u32) {
    draw_centered_text(&format!("Generation: {generation}"), 28.0, 28);
    draw_centered_text(&format!("Alive: {alive}"), 50.0, 20);
    draw_text(
        &format!("Tick: {tick}  FPS: {}", get_fps()),
        10.0,
        20.0,
        18.0,
        Color::new(0.7, 0.75, 0.8, 1.0),
    );
}

fn draw_history(history: &FitnessHistory) {
    if history.best.len() < 2 {
        return;
    }
    let (w, h) = (240.0, 80.0);
    let origin = vec2(10.0, screen_height() - h - 10.0);
    draw_rectangle(origin.x, origin.y, w, h, Color::new(0.0, 0.0, 0.0, 0.6));

    let peak = history.best.max().unwrap_or(1.0).max(1.0);
    let plot = |values: Vec<f32>, color: Color| {
        let step = w / (values.len() - 1) as f32;
        for (i, pair) in values.windows(2).enumerate() {
            let x0 = origin.x + step * i as f32;
            let y0 = origin.y + h - pair[0] / peak * h;
            let y1 = origin.y + h - pair[1] / peak * h;
            draw_line(x0, y0, x0 + step, y1, 1.5, color);
        }
    };
    plot(history.best.iter().collect(), Color::new(0.3, 1.0, 0.3, 0.9));
    plot(history.mean.iter().collect(), Color::new(0.5, 0.6, 1.0, 0.9));
    draw_text("best / mean fitness", origin.x + 4.0, origin.y + 14.0, 16.0, WHITE);
}
