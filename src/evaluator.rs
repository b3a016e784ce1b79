use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::car::CarAgent;
use crate::config::SimConfig;
use crate::error::Result;
use crate::observer::{NullObserver, TickControl, TickFrame, TickObserver};
use crate::policy::{Policy, PolicyId};
use crate::track::BoundaryMask;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// No agent left alive (also the outcome of an empty population).
    AllDead,
    TickBudget,
    Aborted,
}

/// Outcome of one generation: accumulated fitness per policy id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u64,
    pub ticks: u32,
    pub finish: FinishReason,
    pub survivors: usize,
    pub fitness: BTreeMap<PolicyId, f64>,
}

impl GenerationReport {
    pub fn best(&self) -> Option<(PolicyId, f64)> {
        self.fitness
            .iter()
            .map(|(id, f)| (*id, *f))
            .fold(None, |best, (id, f)| match best {
                Some((_, best_f)) if best_f >= f => best,
                _ => Some((id, f)),
            })
    }
}

/// Runs generations and owns the generation counter across them.
pub struct PopulationEvaluator {
    config: SimConfig,
    generation: u64,
}

impl PopulationEvaluator {
    /// Fails when `config` does not pass `SimConfig::validate`.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::with_generation(config, 0)
    }

    /// Resume counting after `generation` already-completed generations.
    pub fn with_generation(config: SimConfig, generation: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, generation })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a generation: bump the counter and spawn one agent per policy, in order.
    ///
    /// A mask too small for the position clamp is rejected before the counter moves.
    pub fn begin<'a>(
        &mut self,
        mask: &'a dyn BoundaryMask,
        policies: Vec<(PolicyId, &'a dyn Policy)>,
    ) -> Result<GenerationRun<'a>> {
        self.config.check_track(mask.width(), mask.height())?;
        self.generation += 1;
        let (ids, policies): (Vec<_>, Vec<_>) = policies.into_iter().unzip();
        let agents: Vec<CarAgent> = ids
            .iter()
            .map(|_| CarAgent::new(self.config, mask.width(), mask.height()))
            .collect();
        debug!(generation = self.generation, agents = agents.len(), "generation started");

        let alive = agents.len();
        Ok(GenerationRun {
            generation: self.generation,
            budget: self.config.tick_budget,
            mask,
            totals: vec![0.0; ids.len()],
            ids,
            policies,
            agents,
            tick: 0,
            alive,
            finish: if alive == 0 {
                Some(FinishReason::AllDead)
            } else {
                None
            },
        })
    }

    pub fn run_generation(
        &mut self,
        mask: &dyn BoundaryMask,
        policies: Vec<(PolicyId, &dyn Policy)>,
    ) -> Result<GenerationReport> {
        self.run_generation_observed(mask, policies, &mut NullObserver)
    }

    pub fn run_generation_observed(
        &mut self,
        mask: &dyn BoundaryMask,
        policies: Vec<(PolicyId, &dyn Policy)>,
        observer: &mut dyn TickObserver,
    ) -> Result<GenerationReport> {
        let mut run = self.begin(mask, policies)?;
        while !run.is_finished() {
            run.step();
            if observer.on_tick(&run.frame()) == TickControl::Abort {
                run.abort();
            }
        }
        Ok(run.finish())
    }
}

/// A generation in progress. `step` advances exactly one tick and does nothing else,
/// so callers can pace or draw between ticks without changing the outcome.
pub struct GenerationRun<'a> {
    generation: u64,
    budget: u32,
    mask: &'a dyn BoundaryMask,
    ids: Vec<PolicyId>,
    policies: Vec<&'a dyn Policy>,
    agents: Vec<CarAgent>,
    totals: Vec<f64>,
    tick: u32,
    alive: usize,
    finish: Option<FinishReason>,
}

impl<'a> GenerationRun<'a> {
    /// Run one tick for every live agent. Returns the finish reason once the run is over.
    pub fn step(&mut self) -> Option<FinishReason> {
        if self.finish.is_some() {
            return self.finish;
        }

        for (i, agent) in self.agents.iter_mut().enumerate() {
            if !agent.is_alive() {
                continue;
            }
            let action = self.policies[i].decide(&agent.sense_vector());
            agent.apply_action(action);
            agent.update(self.mask);
            // Sampled every tick, including the one the agent dies on.
            self.totals[i] += agent.fitness();
        }

        self.tick += 1;
        self.alive = self.agents.iter().filter(|a| a.is_alive()).count();

        if self.alive == 0 {
            self.finish = Some(FinishReason::AllDead);
        } else if self.tick >= self.budget {
            self.finish = Some(FinishReason::TickBudget);
        }
        self.finish
    }

    /// External cancellation. Has no effect once the run has finished on its own.
    pub fn abort(&mut self) {
        self.finish.get_or_insert(FinishReason::Aborted);
    }

    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    pub fn frame(&self) -> TickFrame<'_> {
        TickFrame {
            generation: self.generation,
            tick: self.tick,
            alive: self.alive,
            ids: &self.ids,
            agents: &self.agents,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn alive(&self) -> usize {
        self.alive
    }

    pub fn agents(&self) -> &[CarAgent] {
        &self.agents
    }

    pub fn finish(self) -> GenerationReport {
        let finish = self.finish.unwrap_or(FinishReason::Aborted);
        let mut fitness = BTreeMap::new();
        for (id, total) in self.ids.iter().zip(&self.totals) {
            *fitness.entry(*id).or_insert(0.0) += *total;
        }
        debug!(
            generation = self.generation,
            ticks = self.tick,
            survivors = self.alive,
            ?finish,
            "generation finished"
        );
        GenerationReport {
            generation: self.generation,
            ticks: self.tick,
            finish,
            survivors: self.alive,
            fitness,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::SimError;
    use crate::policy::{Action, SensorVector};
    use crate::track::{generate_ring, TrackMask};

    fn open_track() -> TrackMask {
        TrackMask::from_fn(1920, 1080, |_, _| false)
    }

    fn config(start_x: f32, start_y: f32, tick_budget: u32) -> SimConfig {
        SimConfig {
            start_x,
            start_y,
            tick_budget,
            ..SimConfig::default()
        }
    }

    fn speed_up(_: &SensorVector) -> Action {
        Action::SpeedUp
    }

    #[test]
    fn speed_up_distance_follows_arithmetic_progression() {
        let mask = open_track();
        let n = 10u32;
        let mut evaluator = PopulationEvaluator::new(config(100.0, 500.0, n)).unwrap();
        let policy = speed_up;
        let mut run = evaluator.begin(&mask, vec![(1, &policy as &dyn Policy)]).unwrap();
        while !run.is_finished() {
            run.step();
        }

        let car = &run.agents()[0];
        let n_f = n as f32;
        assert_eq!(car.distance_traveled(), 20.0 * n_f + n_f * (n_f - 1.0));
        assert_eq!(car.speed(), 20.0 + 2.0 * (n_f - 1.0));

        // Per-tick samples: sum over k of (20k + k(k-1)) / 30.
        let expected: f64 = (1..=n as u64)
            .map(|k| (20 * k + k * (k - 1)) as f64 / 30.0)
            .sum();
        let report = run.finish();
        assert!((report.fitness[&1] - expected).abs() < 1e-9);
    }

    #[test]
    fn agent_next_to_wall_dies_on_first_tick() {
        // Front corners start at x = 455; the wall begins one pixel further.
        let mask = TrackMask::from_fn(1920, 1080, |x, _| x >= 457);
        let mut evaluator = PopulationEvaluator::new(config(400.0, 400.0, 1200)).unwrap();
        let policy = speed_up;
        let report = evaluator.run_generation(&mask, vec![(7, &policy as &dyn Policy)]).unwrap();

        assert_eq!(report.ticks, 1);
        assert_eq!(report.finish, FinishReason::AllDead);
        assert_eq!(report.survivors, 0);
        assert!((report.fitness[&7] - 20.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn alternating_turns_restore_heading() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(config(800.0, 500.0, 8)).unwrap();
        let flip = Cell::new(false);
        let policy = |_: &SensorVector| {
            flip.set(!flip.get());
            if flip.get() {
                Action::TurnLeft
            } else {
                Action::TurnRight
            }
        };
        let mut run = evaluator.begin(&mask, vec![(0, &policy as &dyn Policy)]).unwrap();
        let mut headings = Vec::new();
        while !run.is_finished() {
            run.step();
            headings.push(run.agents()[0].angle());
        }
        assert_eq!(headings, vec![10.0, 0.0, 10.0, 0.0, 10.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn budget_stops_at_exact_tick_count() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(config(800.0, 500.0, 25)).unwrap();
        let policy = |_: &SensorVector| Action::Slow;
        let mut ticks_seen = 0;
        let mut observer = |frame: &TickFrame<'_>| {
            ticks_seen = frame.tick;
            assert_eq!(frame.alive, 2);
            TickControl::Continue
        };
        let report = evaluator.run_generation_observed(
            &mask,
            vec![(0, &policy as &dyn Policy), (1, &policy as &dyn Policy)],
            &mut observer,
        ).unwrap();
        assert_eq!(report.ticks, 25);
        assert_eq!(ticks_seen, 25);
        assert_eq!(report.finish, FinishReason::TickBudget);
        assert_eq!(report.survivors, 2);
    }

    #[test]
    fn default_budget_is_1200_ticks() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(config(800.0, 500.0, 1200)).unwrap();
        let policy = |_: &SensorVector| Action::TurnLeft;
        let report = evaluator.run_generation(&mask, vec![(0, &policy as &dyn Policy)]).unwrap();
        assert_eq!(report.ticks, 1200);
        assert_eq!(report.finish, FinishReason::TickBudget);
    }

    #[test]
    fn empty_population_runs_no_ticks() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(SimConfig::default()).unwrap();
        let mut calls = 0;
        let mut observer = |_: &TickFrame<'_>| {
            calls += 1;
            TickControl::Continue
        };
        let report = evaluator.run_generation_observed(&mask, Vec::new(), &mut observer).unwrap();
        assert_eq!(calls, 0);
        assert_eq!(report.ticks, 0);
        assert!(report.fitness.is_empty());
        assert_eq!(report.finish, FinishReason::AllDead);
        assert_eq!(report.generation, 1);
    }

    #[test]
    fn generation_counter_is_owned_and_resumable() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(SimConfig::default()).unwrap();
        assert_eq!(evaluator.run_generation(&mask, Vec::new()).unwrap().generation, 1);
        assert_eq!(evaluator.run_generation(&mask, Vec::new()).unwrap().generation, 2);
        assert_eq!(evaluator.generation(), 2);

        let mut resumed = PopulationEvaluator::with_generation(SimConfig::default(), 41).unwrap();
        assert_eq!(resumed.run_generation(&mask, Vec::new()).unwrap().generation, 42);
    }

    #[test]
    fn fitness_grows_while_alive_and_freezes_after_death() {
        // Wall far to the right: the speeding car dies after a few ticks, the slow turner lives.
        let mask = TrackMask::from_fn(1920, 1080, |x, _| x >= 700);
        let mut evaluator = PopulationEvaluator::new(config(400.0, 400.0, 40)).unwrap();
        let fast = speed_up;
        let circle = |_: &SensorVector| Action::TurnLeft;

        let mut history: Vec<Vec<(bool, f64)>> = Vec::new();
        let mut observer = |frame: &TickFrame<'_>| {
            history.push(
                frame
                    .agents
                    .iter()
                    .map(|a| (a.is_alive(), a.fitness()))
                    .collect(),
            );
            TickControl::Continue
        };
        let report = evaluator.run_generation_observed(
            &mask,
            vec![(0, &fast as &dyn Policy), (1, &circle as &dyn Policy)],
            &mut observer,
        ).unwrap();

        for agent in 0..2 {
            let mut dead_since: Option<f64> = None;
            for pair in history.windows(2) {
                let (alive_a, fit_a) = pair[0][agent];
                let (alive_b, fit_b) = pair[1][agent];
                if alive_a {
                    assert!(fit_b >= fit_a);
                } else {
                    assert!(!alive_b, "agent {agent} came back to life");
                    assert_eq!(fit_b, *dead_since.get_or_insert(fit_a));
                }
            }
        }

        let death_tick = history.iter().position(|t| !t[0].0).unwrap();
        assert!(death_tick < 20);
        let accrued: f64 = history[..=death_tick].iter().map(|t| t[0].1).sum();
        assert!((report.fitness[&0] - accrued).abs() < 1e-9);
        assert_eq!(report.survivors, 1);
    }

    #[test]
    fn observer_abort_keeps_partial_fitness() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(config(800.0, 500.0, 1200)).unwrap();
        let policy = speed_up;
        let mut observer = |frame: &TickFrame<'_>| {
            if frame.tick == 3 {
                TickControl::Abort
            } else {
                TickControl::Continue
            }
        };
        let report = evaluator
            .run_generation_observed(&mask, vec![(3, &policy as &dyn Policy)], &mut observer)
            .unwrap();
        assert_eq!(report.finish, FinishReason::Aborted);
        assert_eq!(report.ticks, 3);
        let expected = (20.0 + 42.0 + 66.0) / 30.0;
        assert!((report.fitness[&3] - expected).abs() < 1e-9);
    }

    #[test]
    fn duplicate_ids_accumulate() {
        let mask = open_track();
        let mut evaluator = PopulationEvaluator::new(config(800.0, 500.0, 2)).unwrap();
        let policy = speed_up;
        let report = evaluator.run_generation(
            &mask,
            vec![(5, &policy as &dyn Policy), (5, &policy as &dyn Policy)],
        ).unwrap();
        assert_eq!(report.fitness.len(), 1);
        let single = (20.0 + 42.0) / 30.0;
        assert!((report.fitness[&5] - 2.0 * single).abs() < 1e-9);
    }

    #[test]
    fn identical_inputs_give_identical_runs() {
        let (mask, start) = generate_ring(1280, 800, 11).unwrap();
        let mut cfg = SimConfig::default();
        start.apply(&mut cfg);
        let steer = |s: &SensorVector| {
            if s[2] < 3 {
                if s[0] > s[4] {
                    Action::TurnRight
                } else {
                    Action::TurnLeft
                }
            } else if s[2] > 6 {
                Action::SpeedUp
            } else {
                Action::Slow
            }
        };
        let cautious = |s: &SensorVector| {
            if s[1] < s[3] {
                Action::TurnLeft
            } else {
                Action::TurnRight
            }
        };

        let trace = || {
            let mut evaluator = PopulationEvaluator::new(cfg).unwrap();
            let mut positions = Vec::new();
            let mut observer = |frame: &TickFrame<'_>| {
                positions.extend(frame.agents.iter().map(|a| (a.position(), a.angle())));
                TickControl::Continue
            };
            let report = evaluator.run_generation_observed(
                &mask,
                vec![(0, &steer as &dyn Policy), (1, &cautious as &dyn Policy)],
                &mut observer,
            ).unwrap();
            (report, positions)
        };

        let (report_a, trace_a) = trace();
        let (report_b, trace_b) = trace();
        assert_eq!(report_a, report_b);
        assert_eq!(trace_a, trace_b);
        for (id, fitness) in &report_a.fitness {
            assert_eq!(fitness.to_bits(), report_b.fitness[id].to_bits());
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let zero_scale = SimConfig {
            sensor_scale: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            PopulationEvaluator::new(zero_scale),
            Err(SimError::InvalidConfig(_))
        ));

        let flat_car = SimConfig {
            car_width: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            PopulationEvaluator::with_generation(flat_car, 3),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn mask_smaller_than_clamp_range_is_rejected() {
        let mask = TrackMask::from_fn(100, 100, |_, _| false);
        let mut evaluator = PopulationEvaluator::new(config(30.0, 30.0, 10)).unwrap();
        let policy = speed_up;
        let err = evaluator
            .run_generation(&mask, vec![(0, &policy as &dyn Policy)])
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::TrackTooSmall {
                width: 100,
                height: 100,
                min: 140
            }
        ));
        assert_eq!(evaluator.generation(), 0);
    }

    #[test]
    fn smallest_accepted_mask_keeps_car_inside_clamp() {
        let mask = TrackMask::from_fn(140, 140, |_, _| false);
        let mut evaluator = PopulationEvaluator::new(config(30.0, 30.0, 3)).unwrap();
        let policy = speed_up;
        let mut run = evaluator.begin(&mask, vec![(0, &policy as &dyn Policy)]).unwrap();
        run.step();
        let position = run.agents()[0].position();
        assert_eq!(position, macroquad::prelude::vec2(20.0, 20.0));
    }

    #[test]
    fn report_best_picks_highest_fitness() {
        let report = GenerationReport {
            generation: 1,
            ticks: 10,
            finish: FinishReason::AllDead,
            survivors: 0,
            fitness: BTreeMap::from([(1, 3.0), (2, 9.5), (3, 9.5), (4, 0.0)]),
        };
        assert_eq!(report.best(), Some((2, 9.5)));
    }
}
