// End-to-end behaviour of the painting pipeline, driven without a window.

use pretty_assertions::assert_eq;

use tode_paint::commands::Command;
use tode_paint::motion::{PainterConfig, PainterId, Painters, PointerInput};
use tode_paint::outline::{render_outline, StrokeStyle};
use tode_paint::scheduler::{Scheduler, Simulation};
use tode_paint::stroke::{PaintHistory, Stroke, StrokeId};
use tode_paint::types::{Colour, Point};
use tode_paint::{Config, Flow, Show};

fn still_painter() -> PainterConfig {
    PainterConfig { offset_y: 0.0, idle_amplitude: 0.0, ..PainterConfig::default() }
}

fn show() -> Show {
    Show::new(&Config { painters: vec![still_painter()], ..Config::default() })
}

fn running() -> Scheduler {
    let mut s = Scheduler::new(1.0, 1.0);
    s.start();
    s
}

#[test]
fn painter_at_rest_moves_a_tenth_of_the_way() {
    let mut painters = Painters::new(&[still_painter()], 60.0);
    let mut history = PaintHistory::new();
    painters.step(PainterId(0), &PointerInput::at(100.0, 0.0), 0.0, Colour::WHITE, &mut history);
    let p = painters.active();
    assert!((p.position.x - 10.0).abs() < 1e-5, "x = {}", p.position.x);
    assert_eq!(p.position.y, 0.0);
}

#[test]
fn far_touch_never_starts_a_stroke() {
    let mut painters = Painters::new(&[still_painter()], 60.0);
    let mut history = PaintHistory::new();
    painters.active_mut().position = Point::new(5.0, 5.0);
    let input = PointerInput { touches: vec![Point::new(200.0, 200.0)], ..PointerInput::default() };
    painters.step(PainterId(0), &input, 0.0, Colour::WHITE, &mut history);
    assert!(!painters.active().is_painting);
    assert!(history.is_empty());
}

#[test]
fn close_samples_collapse_to_two_points() {
    let mut stroke = Stroke::new(StrokeId(0), Point::new(0.0, 0.0), Colour::WHITE, StrokeStyle::default(), false);
    stroke.record_sample(Point::new(1.0, 1.0));
    stroke.record_sample(Point::new(2.0, 2.0));
    assert_eq!(stroke.points(), &[Point::new(0.0, 0.0), Point::new(2.0, 2.0)]);
}

#[test]
fn double_pause_toggle_resumes_steps() {
    let mut show = show();
    let mut sched = running();
    let before = sched.is_paused();
    show.apply(Command::TogglePause, &mut sched);
    show.apply(Command::TogglePause, &mut sched);
    assert_eq!(sched.is_paused(), before);

    show.set_input(PointerInput::at(100.0, 0.0));
    sched.tick(&mut show);
    assert!(show.painters().active().position.x > 0.0);
}

#[test]
fn jittery_samples_stay_at_two_points() {
    let mut stroke = Stroke::new(StrokeId(0), Point::ZERO, Colour::WHITE, StrokeStyle::default(), false);
    for i in 0..50 {
        let wobble = if i % 2 == 0 { 1.5 } else { -1.5 };
        stroke.record_sample(Point::new(wobble, wobble * 0.5));
    }
    assert_eq!(stroke.points().len(), 2);
}

#[test]
fn spread_samples_are_all_kept() {
    let mut stroke = Stroke::new(StrokeId(0), Point::ZERO, Colour::WHITE, StrokeStyle::default(), false);
    for i in 1..=20 {
        stroke.record_sample(Point::new(i as f32 * 6.0, 0.0));
    }
    assert_eq!(stroke.points().len(), 21);
}

#[test]
fn outline_is_a_pure_function_of_points() {
    let pts: Vec<Point> = (0..12).map(|i| Point::new(i as f32 * 7.0, (i as f32 * 0.7).sin() * 20.0)).collect();
    let style = StrokeStyle::default();
    assert_eq!(render_outline(&pts, &style), render_outline(&pts, &style));
    assert!(render_outline(&[], &style).is_empty());
}

#[test]
fn speed_and_fade_stay_bounded_over_a_long_session() {
    let config = PainterConfig { speed: 0.1, max_speed: Some(0.3), min_speed: Some(0.02), ..still_painter() };
    let (min, max) = config.speed_bounds();
    let mut painters = Painters::new(&[config], 60.0);
    let mut history = PaintHistory::new();
    for i in 0..2000 {
        let mut input = PointerInput::at((i % 300) as f32, (i % 170) as f32);
        input.pressed = (i / 40) % 2 == 0;
        input.alternate = (i / 130) % 2 == 1;
        painters.step(PainterId(0), &input, i as f32 / 60.0, Colour::WHITE, &mut history);
        let p = painters.active();
        assert!((min..=max).contains(&p.speed()), "speed {}", p.speed());
        assert!((0.0..=1.0).contains(&p.idle_fade_power()));
    }
    assert!(history.history().len() > 10);
    assert!(history.iter().all(|s| s.points().len() >= 1));
}

#[test]
fn a_full_gesture_through_the_show() {
    let mut show = show();
    let mut sched = running();
    sched.resize(200, 100, &mut show);

    let mut input = PointerInput::at(150.0, 50.0);
    input.pressed = true;
    show.set_input(input.clone());
    for _ in 0..30 {
        sched.tick(&mut show);
    }
    input.pressed = false;
    show.set_input(input);
    sched.tick(&mut show);

    let history = show.history();
    assert!(!history.is_painting());
    assert_eq!(history.history().len(), 1);
    let stroke = &history.history()[0];
    assert!(stroke.is_sealed());
    assert!(stroke.points().len() > 2);
    assert!(!stroke.outline().is_empty());

    show.render(false, 60.0);
    assert!(show.frame().pixels.iter().any(|&p| p == Colour::WHITE.packed()));
    assert_eq!(show.apply(Command::Quit, &mut sched), Flow::Quit);
}

#[test]
fn screenshot_writes_png_and_svg() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config { painters: vec![still_painter()], ..Config::default() };
    config.export.directory = dir.path().join("shots");
    let mut show = Show::new(&config);
    let mut sched = running();
    sched.resize(64, 64, &mut show);

    let mut input = PointerInput::at(60.0, 60.0);
    input.pressed = true;
    show.set_input(input);
    for _ in 0..10 {
        sched.tick(&mut show);
    }
    show.apply(Command::Screenshot, &mut sched);
    show.render(false, 0.0);

    let png = dir.path().join("shots/picture-001.png");
    let svg = dir.path().join("shots/picture-001.svg");
    assert!(png.exists());
    let doc = std::fs::read_to_string(svg).unwrap();
    assert!(doc.contains(r#"id="stroke-0""#));
    let img = image::open(png).unwrap();
    assert_eq!((img.width(), img.height()), (64, 64));
}

#[test]
fn resize_keeps_simulation_time() {
    struct Steps(u32);
    impl Simulation for Steps {
        fn step(&mut self) {
            self.0 += 1;
        }
    }
    let mut sim = Steps(0);
    let mut sched = Scheduler::new(0.5, 2.0);
    assert_eq!(sched.tick(&mut sim), 0);
    sched.start();
    assert!(sched.is_started());
    sched.tick(&mut sim);
    let size = sched.resize(100, 50, &mut sim);
    assert_eq!((size.width, size.height), (200, 100));
    assert_eq!(sched.surface(), Some(size));
    sched.tick(&mut sim);
    sched.tick(&mut sim);
    assert_eq!(sim.0, 2);
}
