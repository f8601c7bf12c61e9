//! Decorative particle field.
//!
//! A fixed set of points drifts across the viewport, bounces off its edges,
//! shies away from the pointer and pulses in opacity.  Points closer than a
//! threshold are joined by faint lines.  The field is plain data; drawing goes
//! through the [`Canvas`] trait so any surface can host it.

use rand::Rng;

/// Pointer distance below which particles are pushed away.
pub const POINTER_RADIUS: f64 = 150.0;

/// Strength of the pointer push.
pub const POINTER_FORCE: f64 = 0.02;

/// Default distance below which two particles are linked.
pub const LINK_DISTANCE: f64 = 100.0;

/// Peak opacity of a link line.
const LINK_ALPHA: f64 = 0.3;

/// A point in viewport coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the drawing surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Creates a viewport, treating negative and NaN sizes as zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// The same viewport with negative or NaN sizes replaced by zero.
    pub fn normalized(self) -> Self {
        Self::new(self.width, self.height)
    }

    /// The centre of the viewport.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn contains(&self, p: Point) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// How many particles to spawn for a viewport of the given width.
pub fn particle_count_for_width(width: f64) -> usize {
    if width < 768.0 {
        30
    } else if width < 1200.0 {
        50
    } else {
        70
    }
}

/// One drifting point.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Horizontal velocity per tick.
    pub vx: f64,
    /// Vertical velocity per tick.
    pub vy: f64,
    /// Radius in pixels.
    pub radius: f64,
    /// Index into the field's palette.
    pub color: usize,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Particle {
    /// Spawn a particle at a random spot inside `viewport`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, viewport: Viewport, colors: usize) -> Self {
        Self {
            x: rng.r#gen::<f64>() * viewport.width,
            y: rng.r#gen::<f64>() * viewport.height,
            vx: (rng.r#gen::<f64>() - 0.5) * 0.8,
            vy: (rng.r#gen::<f64>() - 0.5) * 0.8,
            radius: rng.r#gen::<f64>() * 3.0 + 1.0,
            color: if colors == 0 { 0 } else { rng.gen_range(0..colors) },
            opacity: rng.r#gen::<f64>() * 0.5 + 0.3,
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, viewport: Viewport, pointer: Option<Point>, elapsed_secs: f64) {
        let viewport = viewport.normalized();
        self.x += self.vx;
        self.y += self.vy;

        if self.x < 0.0 || self.x > viewport.width {
            self.vx = -self.vx;
        }
        if self.y < 0.0 || self.y > viewport.height {
            self.vy = -self.vy;
        }

        if let Some(pointer) = pointer {
            let dx = pointer.x - self.x;
            let dy = pointer.y - self.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < POINTER_RADIUS {
                let force = (POINTER_RADIUS - dist) / POINTER_RADIUS;
                self.x -= dx * force * POINTER_FORCE;
                self.y -= dy * force * POINTER_FORCE;
            }
        }

        self.x = self.x.clamp(0.0, viewport.width);
        self.y = self.y.clamp(0.0, viewport.height);
        self.opacity = (elapsed_secs + self.x * 0.01).sin() * 0.2 + 0.4;
    }

    fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A line between two nearby particles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Link {
    /// Index of the first particle.
    pub a: usize,
    /// Index of the second particle.
    pub b: usize,
    /// Line opacity.
    pub alpha: f64,
}

/// A surface the field can draw itself onto.
pub trait Canvas {
    /// Erase the whole surface.
    fn clear(&mut self, viewport: Viewport);

    /// Fill a circle.
    fn fill_circle(&mut self, center: Point, radius: f64, color: &str, alpha: f64);

    /// Stroke a one pixel line.
    fn line(&mut self, from: Point, to: Point, color: &str, alpha: f64);
}

/// The full set of particles plus the state they react to.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    palette: Vec<String>,
    viewport: Viewport,
    pointer: Option<Point>,
    link_distance: f64,
}

impl ParticleField {
    /// Spawn `count` particles inside `viewport`, tinted from `palette`.
    ///
    /// The pointer starts at the centre of the viewport.
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        viewport: Viewport,
        palette: &[&str],
        rng: &mut R,
    ) -> Self {
        let viewport = viewport.normalized();
        let particles = (0..count)
            .map(|_| Particle::random(rng, viewport, palette.len()))
            .collect();
        Self {
            particles,
            palette: palette.iter().map(|c| c.to_string()).collect(),
            viewport,
            pointer: Some(viewport.center()),
            link_distance: LINK_DISTANCE,
        }
    }

    /// Spawn as many particles as suit the viewport width.
    pub fn for_viewport<R: Rng + ?Sized>(
        viewport: Viewport,
        palette: &[&str],
        rng: &mut R,
    ) -> Self {
        Self::new(particle_count_for_width(viewport.width), viewport, palette, rng)
    }

    /// Sets the link distance.
    pub fn with_link_distance(mut self, link_distance: f64) -> Self {
        self.link_distance = link_distance.max(0.0);
        self
    }

    /// The particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The colour of `particle`.
    pub fn color_of(&self, particle: &Particle) -> &str {
        self.palette
            .get(particle.color)
            .map(String::as_str)
            .unwrap_or("#ffffff")
    }

    /// Record where the pointer is; `None` when it left the surface.
    pub fn set_pointer(&mut self, pointer: Option<Point>) {
        self.pointer = pointer;
    }

    /// Adapt to a new surface size, pulling particles back inside it.
    pub fn resize(&mut self, viewport: Viewport) {
        let viewport = viewport.normalized();
        self.viewport = viewport;
        for p in &mut self.particles {
            p.x = p.x.clamp(0.0, viewport.width);
            p.y = p.y.clamp(0.0, viewport.height);
        }
    }

    /// Swap the palette.  Particles keep their slot, so a theme switch re-tints
    /// them without reshuffling.
    pub fn recolor(&mut self, palette: &[&str]) {
        self.palette = palette.iter().map(|c| c.to_string()).collect();
        let colors = self.palette.len().max(1);
        for p in &mut self.particles {
            p.color %= colors;
        }
    }

    /// Advance every particle one tick.
    pub fn tick(&mut self, elapsed_secs: f64) {
        for p in &mut self.particles {
            p.update(self.viewport, self.pointer, elapsed_secs);
        }
    }

    /// Pairs of particles closer than the link distance.
    pub fn links(&self) -> Vec<Link> {
        let threshold = self.link_distance;
        let mut links = Vec::new();
        if threshold <= 0.0 {
            return links;
        }
        for (i, a) in self.particles.iter().enumerate() {
            for (j, b) in self.particles.iter().enumerate().skip(i + 1) {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < threshold {
                    links.push(Link {
                        a: i,
                        b: j,
                        alpha: (threshold - dist) / threshold * LINK_ALPHA,
                    });
                }
            }
        }
        links
    }

    /// Advance one tick and draw the frame: links first, then the particles,
    /// both from the advanced positions.
    pub fn frame(&mut self, canvas: &mut dyn Canvas, elapsed_secs: f64) {
        self.tick(elapsed_secs);
        canvas.clear(self.viewport);
        for link in self.links() {
            let a = &self.particles[link.a];
            let b = &self.particles[link.b];
            canvas.line(a.position(), b.position(), self.color_of(a), link.alpha);
        }
        for p in &self.particles {
            canvas.fill_circle(p.position(), p.radius, self.color_of(p), p.opacity);
        }
    }

    /// Returns true if every particle lies inside the viewport.
    pub fn all_inside(&self) -> bool {
        self.particles
            .iter()
            .all(|p| self.viewport.contains(p.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::theme::{DARK_PALETTE, LIGHT_PALETTE};

    #[derive(Default)]
    struct RecordingCanvas {
        clears: usize,
        circles: Vec<(Point, String)>,
        lines: Vec<(Point, Point)>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self, _: Viewport) {
            self.clears += 1;
        }

        fn fill_circle(&mut self, center: Point, _: f64, color: &str, _: f64) {
            self.circles.push((center, color.to_string()));
        }

        fn line(&mut self, from: Point, to: Point, _: &str, _: f64) {
            self.lines.push((from, to));
        }
    }

    fn still(x: f64, y: f64) -> Particle {
        Particle {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: 2.0,
            color: 0,
            opacity: 0.5,
        }
    }

    #[test]
    fn count_follows_width() {
        assert_eq!(particle_count_for_width(320.0), 30);
        assert_eq!(particle_count_for_width(1024.0), 50);
        assert_eq!(particle_count_for_width(1920.0), 70);
    }

    #[test]
    fn spawned_particles_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = ParticleField::new(200, Viewport::new(800.0, 600.0), &LIGHT_PALETTE, &mut rng);
        assert_eq!(field.particles().len(), 200);
        for p in field.particles() {
            assert!((1.0..4.0).contains(&p.radius));
            assert!((-0.4..0.4).contains(&p.vx));
            assert!((0.3..0.8).contains(&p.opacity));
            assert!(p.color < LIGHT_PALETTE.len());
        }
        assert!(field.all_inside());
    }

    #[test]
    fn particles_stay_inside_viewport() {
        let mut rng = StdRng::seed_from_u64(42);
        let viewport = Viewport::new(400.0, 300.0);
        let mut field = ParticleField::new(70, viewport, &DARK_PALETTE, &mut rng);
        for frame in 0..2_000 {
            field.set_pointer(Some(Point::new((frame % 400) as f64, 150.0)));
            field.tick(frame as f64 / 60.0);
            assert!(field.all_inside(), "escaped at frame {frame}");
        }
    }

    #[test]
    fn velocity_reflects_at_edge() {
        let viewport = Viewport::new(100.0, 100.0);
        let mut p = still(99.9, 50.0);
        p.vx = 0.5;
        p.update(viewport, None, 0.0);
        assert!(p.vx < 0.0);
        assert!(p.x <= viewport.width);
    }

    #[test]
    fn pointer_pushes_particle_away() {
        let viewport = Viewport::new(500.0, 500.0);
        let mut p = still(200.0, 200.0);
        p.update(viewport, Some(Point::new(250.0, 200.0)), 0.0);
        assert!(p.x < 200.0);
        assert_eq!(p.y, 200.0);

        let mut far = still(200.0, 200.0);
        far.update(viewport, Some(Point::new(400.0, 200.0)), 0.0);
        assert_eq!(far.x, 200.0);
    }

    #[test]
    fn opacity_pulses_within_band() {
        let viewport = Viewport::new(500.0, 500.0);
        let mut p = still(120.0, 80.0);
        for step in 0..100 {
            p.update(viewport, None, step as f64 * 0.37);
            assert!((0.2..=0.6).contains(&p.opacity));
        }
    }

    #[test]
    fn links_only_between_close_particles() {
        let mut rng = StdRng::seed_from_u64(1);
        let viewport = Viewport::new(500.0, 500.0);
        let mut field = ParticleField::new(0, viewport, &LIGHT_PALETTE, &mut rng);
        field.particles = vec![still(0.0, 0.0), still(50.0, 0.0), still(400.0, 400.0)];

        let links = field.links();
        assert_eq!(links.len(), 1);
        assert_eq!((links[0].a, links[0].b), (0, 1));
        assert!((links[0].alpha - 0.15).abs() < 1e-9);
    }

    #[test]
    fn empty_field_and_zero_viewport_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::new(10, Viewport::new(0.0, 0.0), &[], &mut rng);
        let mut canvas = RecordingCanvas::default();
        field.frame(&mut canvas, 1.0);
        assert!(field.all_inside());

        let mut empty = ParticleField::new(0, Viewport::new(-5.0, 10.0), &LIGHT_PALETTE, &mut rng);
        empty.frame(&mut canvas, 2.0);
        assert!(empty.links().is_empty());
        assert_eq!(canvas.clears, 2);
    }

    #[test]
    fn frame_draws_every_particle() {
        let mut rng = StdRng::seed_from_u64(9);
        let viewport = Viewport::new(300.0, 300.0);
        let mut field = ParticleField::new(12, viewport, &LIGHT_PALETTE, &mut rng);
        let mut canvas = RecordingCanvas::default();
        field.frame(&mut canvas, 0.0);

        assert_eq!(canvas.clears, 1);
        assert_eq!(canvas.circles.len(), 12);
        assert_eq!(canvas.lines.len(), field.links().len());
    }

    #[test]
    fn links_are_drawn_from_advanced_positions() {
        let mut rng = StdRng::seed_from_u64(1);
        let viewport = Viewport::new(500.0, 500.0);
        let mut field = ParticleField::new(0, viewport, &LIGHT_PALETTE, &mut rng);
        let mut a = still(100.0, 100.0);
        a.vx = 2.0;
        field.particles = vec![a, still(140.0, 100.0)];
        field.set_pointer(None);

        let mut canvas = RecordingCanvas::default();
        field.frame(&mut canvas, 0.0);

        assert_eq!(canvas.lines.len(), 1);
        let (from, to) = canvas.lines[0];
        assert_eq!(from, canvas.circles[0].0);
        assert_eq!(to, canvas.circles[1].0);
        assert_eq!(from, Point::new(102.0, 100.0));
    }

    #[test]
    fn recolor_switches_palette() {
        let mut rng = StdRng::seed_from_u64(5);
        let viewport = Viewport::new(300.0, 300.0);
        let mut field = ParticleField::new(20, viewport, &LIGHT_PALETTE, &mut rng);
        field.recolor(&DARK_PALETTE);
        for p in field.particles() {
            assert!(DARK_PALETTE.contains(&field.color_of(p)));
        }
    }

    #[test]
    fn unnormalized_viewports_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(13);
        let viewport = Viewport::new(300.0, 300.0);
        let mut field = ParticleField::new(20, viewport, &LIGHT_PALETTE, &mut rng);
        let mut canvas = RecordingCanvas::default();

        field.resize(Viewport {
            width: -10.0,
            height: 100.0,
        });
        field.frame(&mut canvas, 1.0);
        assert!(field.all_inside());

        field.resize(Viewport {
            width: f64::NAN,
            height: f64::NAN,
        });
        field.frame(&mut canvas, 2.0);
        assert!(field.all_inside());
        assert_eq!(field.viewport(), Viewport::new(0.0, 0.0));

        let mut p = still(50.0, 50.0);
        p.update(
            Viewport {
                width: -1.0,
                height: f64::NAN,
            },
            None,
            0.0,
        );
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn resize_pulls_particles_inside() {
        let mut rng = StdRng::seed_from_u64(11);
        let viewport = Viewport::new(1000.0, 800.0);
        let mut field = ParticleField::new(50, viewport, &LIGHT_PALETTE, &mut rng);
        field.resize(Viewport::new(200.0, 100.0));
        assert!(field.all_inside());
    }
}
