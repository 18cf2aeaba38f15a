// Fixed-step scheduler.
// Turns "one callback per real frame" into a whole number of logical steps
// using a fractional accumulator. `speed` is logical steps per real frame:
// 0.5 runs a step every other frame, 3.0 runs three per frame.
// Real frame time is not consulted, so a slow machine sees slow motion
// rather than big jumps.
// Visual: pausing freezes the mascot mid-pose while the picture flash still fades.

use tracing::info;

/// Host-side callbacks driven by the scheduler.
pub trait Simulation {
    /// One logical step. Skipped while paused.
    fn step(&mut self);

    /// Runs once per loop iteration even while paused (freeze/picture effects).
    fn supertick(&mut self) {}

    /// The drawable surface changed size. Simulation time is untouched.
    fn resize(&mut self, _surface: SurfaceSize) {}
}

/// Drawable surface dimensions in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug)]
pub struct Scheduler {
    t: f32,
    speed: f32,
    paused: bool,
    started: bool,
    pixel_ratio: f32,
    surface: Option<SurfaceSize>,
}

impl Scheduler {
    pub fn new(speed: f32, pixel_ratio: f32) -> Self {
        Self {
            t: 0.0,
            speed,
            paused: false,
            started: false,
            pixel_ratio,
            surface: None,
        }
    }

    /// The host is ready (window exists, first resize delivered).
    pub fn start(&mut self) {
        if !self.started {
            info!(speed = self.speed, "scheduler started");
        }
        self.started = true;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn surface(&self) -> Option<SurfaceSize> {
        self.surface
    }

    /// Flip the pause flag. One call per input event, no debouncing.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(paused = self.paused, "pause toggled");
    }

    /// Advance one real frame. Returns how many loop iterations ran
    /// (steps plus superticks share the same count).
    pub fn tick<S: Simulation + ?Sized>(&mut self, sim: &mut S) -> u32 {
        if !self.started {
            return 0;
        }
        let mut iterations = 0;
        self.t += self.speed;
        while self.t > 0.0 {
            if !self.paused {
                sim.step();
            }
            sim.supertick();
            self.t -= 1.0;
            iterations += 1;
        }
        iterations
    }

    /// Window resized: derive device-pixel surface size and notify the simulation.
    pub fn resize<S: Simulation + ?Sized>(&mut self, window_width: usize, window_height: usize, sim: &mut S) -> SurfaceSize {
        let surface = SurfaceSize {
            width: (window_width as f32 * self.pixel_ratio).round() as usize,
            height: (window_height as f32 * self.pixel_ratio).round() as usize,
        };
        if self.surface != Some(surface) {
            info!(width = surface.width, height = surface.height, "surface resized");
        }
        self.surface = Some(surface);
        sim.resize(surface);
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        steps: u32,
        superticks: u32,
        resizes: Vec<SurfaceSize>,
    }

    impl Simulation for Counter {
        fn step(&mut self) {
            self.steps += 1;
        }
        fn supertick(&mut self) {
            self.superticks += 1;
        }
        fn resize(&mut self, surface: SurfaceSize) {
            self.resizes.push(surface);
        }
    }

    fn started(speed: f32) -> Scheduler {
        let mut s = Scheduler::new(speed, 1.0);
        s.start();
        s
    }

    #[test]
    fn does_nothing_before_start() {
        let mut s = Scheduler::new(1.0, 1.0);
        let mut c = Counter::default();
        assert_eq!(s.tick(&mut c), 0);
        assert_eq!(c.steps, 0);
    }

    #[test]
    fn unit_speed_runs_one_step_per_frame() {
        let mut s = started(1.0);
        let mut c = Counter::default();
        for _ in 0..10 {
            s.tick(&mut c);
        }
        assert_eq!(c.steps, 10);
        assert_eq!(c.superticks, 10);
    }

    #[test]
    fn fractional_speed_sub_steps() {
        let mut s = started(0.5);
        let mut c = Counter::default();
        let per_frame: Vec<u32> = (0..4).map(|_| s.tick(&mut c)).collect();
        assert_eq!(per_frame, vec![1, 0, 1, 0]);
        assert_eq!(c.steps, 2);
    }

    #[test]
    fn multi_step_speed() {
        let mut s = started(3.0);
        let mut c = Counter::default();
        assert_eq!(s.tick(&mut c), 3);
        assert_eq!(c.steps, 3);
    }

    #[test]
    fn paused_still_superticks() {
        let mut s = started(1.0);
        let mut c = Counter::default();
        s.toggle_pause();
        s.tick(&mut c);
        s.tick(&mut c);
        assert_eq!(c.steps, 0);
        assert_eq!(c.superticks, 2);
    }

    #[test]
    fn double_toggle_resumes() {
        let mut s = started(1.0);
        let mut c = Counter::default();
        s.toggle_pause();
        s.toggle_pause();
        assert!(!s.is_paused());
        s.tick(&mut c);
        assert_eq!(c.steps, 1);
    }

    #[test]
    fn resize_applies_pixel_ratio_and_keeps_time() {
        let mut s = Scheduler::new(0.5, 2.0);
        s.start();
        let mut c = Counter::default();
        s.tick(&mut c); // t: 0.5 -> -0.5
        let size = s.resize(100, 50, &mut c);
        assert_eq!(size, SurfaceSize { width: 200, height: 100 });
        assert_eq!(c.resizes, vec![size]);
        // accumulator survived the resize: next frame brings t back to 0, no step
        assert_eq!(s.tick(&mut c), 0);
        assert_eq!(s.tick(&mut c), 1);
    }
}
