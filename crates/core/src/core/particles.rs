//! Animated "data" particles moving between hardware shapes.
//!
//! Motion is a per-frame linear interpolation toward the current waypoint.
//! Direct particles head straight for their target; bus particles route via
//! a horizontal lane between two vertical rails.

use crate::prng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleKind {
    /// Host -> device traffic; vanishes on arrival.
    Input,
    /// A generated token heading back to the host.
    Output(String),
    /// Device-internal traffic routed over the bus.
    Bus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStage {
    Entrance,
    Bus,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub target: Vec2,
    pub color: &'static str,
    pub size: f64,
    pub kind: ParticleKind,
    pub stage: BusStage,
    pub bus_y: f64,
}

impl Particle {
    fn is_direct(&self) -> bool {
        !matches!(self.kind, ParticleKind::Bus)
    }
}

/// An output particle that reached the host this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub payload: String,
}

#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    left_rail: f64,
    right_rail: f64,
    bus_lanes: Vec<f64>,
    direct_threshold: f64,
    bus_threshold: f64,
}

impl ParticleField {
    pub fn new(left_rail: f64, right_rail: f64, bus_lanes: Vec<f64>) -> Self {
        Self {
            particles: Vec::new(),
            left_rail,
            right_rail,
            bus_lanes,
            direct_threshold: 2.0,
            bus_threshold: 3.0,
        }
    }

    pub fn bus_lanes(&self) -> &[f64] {
        &self.bus_lanes
    }

    pub fn rails(&self) -> (f64, f64) {
        (self.left_rail, self.right_rail)
    }

    pub fn spawn_direct(
        &mut self,
        from: Vec2,
        to: Vec2,
        color: &'static str,
        size: f64,
        payload: Option<String>,
    ) {
        let kind = match payload {
            Some(p) => ParticleKind::Output(p),
            None => ParticleKind::Input,
        };
        self.particles.push(Particle {
            pos: from,
            target: to,
            color,
            size,
            kind,
            stage: BusStage::Exit,
            bus_y: from.y,
        });
    }

    pub fn spawn_bus(
        &mut self,
        from: Vec2,
        to: Vec2,
        color: &'static str,
        size: f64,
        rng: &mut impl RandomSource,
    ) {
        let bus_y = if self.bus_lanes.is_empty() {
            from.y
        } else {
            self.bus_lanes[rng.gen_range_usize(0, self.bus_lanes.len())]
        };
        self.particles.push(Particle {
            pos: from,
            target: to,
            color,
            size,
            kind: ParticleKind::Bus,
            stage: BusStage::Entrance,
            bus_y,
        });
    }

    /// Moves every particle by `factor` of its remaining distance (clamped to
    /// [0, 1]) and drops the ones that arrived. Distances are measured before
    /// the move.
    pub fn step(&mut self, factor: f64) -> Vec<Arrival> {
        let k = factor.clamp(0.0, 1.0);
        let (left, right) = (self.left_rail, self.right_rail);
        let direct_threshold = self.direct_threshold;
        let bus_threshold = self.bus_threshold;
        let mut arrivals = Vec::new();

        self.particles.retain_mut(|p| {
            if p.is_direct() {
                let dx = p.target.x - p.pos.x;
                let dy = p.target.y - p.pos.y;
                p.pos.x += dx * k;
                p.pos.y += dy * k;
                if dx.abs() < direct_threshold && dy.abs() < direct_threshold {
                    if let ParticleKind::Output(payload) = &p.kind {
                        arrivals.push(Arrival {
                            payload: payload.clone(),
                        });
                    }
                    return false;
                }
                return true;
            }

            let heading_left = p.target.x < p.pos.x;
            match p.stage {
                BusStage::Entrance => {
                    let rail = if heading_left { right } else { left };
                    let dx = rail - p.pos.x;
                    let dy = p.bus_y - p.pos.y;
                    p.pos.x += dx * k;
                    p.pos.y += dy * k;
                    if dx.abs() < bus_threshold && dy.abs() < bus_threshold {
                        p.stage = BusStage::Bus;
                    }
                    true
                }
                BusStage::Bus => {
                    let rail = if heading_left { left } else { right };
                    let dx = rail - p.pos.x;
                    p.pos.x += dx * k;
                    if dx.abs() < bus_threshold {
                        p.stage = BusStage::Exit;
                    }
                    true
                }
                BusStage::Exit => {
                    let dx = p.target.x - p.pos.x;
                    let dy = p.target.y - p.pos.y;
                    p.pos.x += dx * k;
                    p.pos.y += dy * k;
                    !(dx.abs() < bus_threshold && dy.abs() < bus_threshold)
                }
            }
        });

        arrivals
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::ScriptedRandom;

    fn field() -> ParticleField {
        ParticleField::new(175.0, 625.0, (0..8).map(|i| 80.0 + i as f64 * 20.0).collect())
    }

    fn run_until_empty(f: &mut ParticleField, factor: f64) -> (usize, Vec<Arrival>) {
        let mut frames = 0;
        let mut all = Vec::new();
        while !f.is_empty() {
            all.extend(f.step(factor));
            frames += 1;
            assert!(frames < 10_000, "particles never settled");
        }
        (frames, all)
    }

    #[test]
    fn direct_particle_interpolates_and_arrives() {
        let mut f = field();
        f.spawn_direct(
            Vec2::new(700.0, 50.0),
            Vec2::new(700.0, -10.0),
            "#60a5fa",
            4.0,
            Some("hello".into()),
        );
        f.step(0.5);
        let p = &f.particles()[0];
        assert_eq!(p.pos, Vec2::new(700.0, 20.0));

        let (_, arrivals) = run_until_empty(&mut f, 0.5);
        assert_eq!(
            arrivals,
            vec![Arrival {
                payload: "hello".into()
            }]
        );
    }

    #[test]
    fn input_particles_arrive_silently() {
        let mut f = field();
        f.spawn_direct(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), "#3b82f6", 2.0, None);
        assert!(f.step(0.2).is_empty());
        assert!(f.is_empty());
    }

    #[test]
    fn bus_particle_visits_lane_then_exits() {
        let mut f = field();
        let mut rng = ScriptedRandom::constant(0.0);
        f.spawn_bus(
            Vec2::new(625.0, 150.0),
            Vec2::new(175.0, 100.0),
            "#ef4444",
            3.0,
            &mut rng,
        );
        assert_eq!(f.particles()[0].bus_y, 80.0);

        let mut saw_bus = false;
        for _ in 0..200 {
            f.step(0.18);
            match f.particles().first() {
                Some(p) if p.stage == BusStage::Bus => {
                    saw_bus = true;
                    assert!((p.pos.y - 80.0).abs() < 3.0);
                }
                Some(_) => {}
                None => break,
            }
        }
        assert!(saw_bus);
        assert!(f.is_empty());
    }

    #[test]
    fn zero_factor_freezes_and_clear_drops_everything() {
        let mut f = field();
        f.spawn_direct(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), "#fff", 1.0, None);
        f.step(0.0);
        assert_eq!(f.particles()[0].pos, Vec2::new(0.0, 0.0));
        f.clear();
        assert_eq!(f.len(), 0);
    }
}
