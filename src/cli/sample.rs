//! Sample command implementation.
//!
//! Runs many independent generate-then-mutate trials in parallel and reports
//! how often each strategy fires and how often it leaves the graph unchanged.

use super::{CliError, OutputFormat, load_components, load_mutation_config};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use symgraph::agraph::{AgraphMutation, ComponentGenerator, GraphGenerator, MutationKind};

/// Per-strategy counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
struct KindStats {
    /// Times the strategy was drawn.
    applied: u64,
    /// Times the child's commands equalled the parent's.
    unchanged: u64,
    /// Sum of child minus parent complexity.
    complexity_delta: i64,
}

/// Aggregated sampling results.
#[derive(Debug, Clone, Default, Serialize)]
struct SampleStats {
    trials: u64,
    command: KindStats,
    node: KindStats,
    parameter: KindStats,
    prune: KindStats,
}

impl SampleStats {
    fn slot(&mut self, kind: MutationKind) -> &mut KindStats {
        match kind {
            MutationKind::Command => &mut self.command,
            MutationKind::Node => &mut self.node,
            MutationKind::Parameter => &mut self.parameter,
            MutationKind::Prune => &mut self.prune,
        }
    }

    fn record(&mut self, kind: MutationKind, unchanged: bool, complexity_delta: i64) {
        self.trials += 1;
        let slot = self.slot(kind);
        slot.applied += 1;
        slot.unchanged += u64::from(unchanged);
        slot.complexity_delta += complexity_delta;
    }

    fn merge(&mut self, other: &Self) {
        self.trials += other.trials;
        for kind in MutationKind::ALL {
            let theirs = match kind {
                MutationKind::Command => other.command,
                MutationKind::Node => other.node,
                MutationKind::Parameter => other.parameter,
                MutationKind::Prune => other.prune,
            };
            let ours = self.slot(kind);
            ours.applied += theirs.applied;
            ours.unchanged += theirs.unchanged;
            ours.complexity_delta += theirs.complexity_delta;
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
fn signed(value: usize) -> i64 {
    value as i64
}

#[allow(clippy::cast_precision_loss)]
fn format_text(stats: &SampleStats) -> String {
    let mut output = format!("Mutation sample ({} trials)\n", stats.trials);
    output.push_str("  kind        applied  unchanged  mean complexity delta\n");
    for (name, kind) in [
        ("command", stats.command),
        ("node", stats.node),
        ("parameter", stats.parameter),
        ("prune", stats.prune),
    ] {
        let mean = if kind.applied > 0 {
            kind.complexity_delta as f64 / kind.applied as f64
        } else {
            0.0
        };
        output.push_str(&format!(
            "  {name:<10} {:>8} {:>10} {mean:>22.3}\n",
            kind.applied, kind.unchanged
        ));
    }
    output
}

/// Run `count` generate-then-mutate trials, ticking `pb` as each one ends.
fn run_trials<G: ComponentGenerator + Sync>(
    generator: &GraphGenerator<G>,
    mutation: &AgraphMutation<G>,
    seed: u64,
    count: u64,
    pb: Option<&ProgressBar>,
) -> SampleStats {
    (0..count)
        .into_par_iter()
        .fold(SampleStats::default, |mut local, i| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i));
            let parent = generator.generate(&mut rng);
            let kind = mutation.choose_kind(&mut rng);
            let child = mutation.mutate_with(kind, &parent, &mut rng);
            let delta = signed(child.complexity()) - signed(parent.complexity());
            local.record(kind, child.commands() == parent.commands(), delta);
            if let Some(pb) = pb {
                pb.inc(1);
            }
            local
        })
        .reduce(SampleStats::default, |mut a, b| {
            a.merge(&b);
            a
        })
}

/// Execute the sample command.
///
/// Trial `i` is seeded with `seed + i`, so results do not depend on the
/// number of threads.
///
/// # Errors
///
/// Returns an error if a configuration is invalid.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    rows: usize,
    count: u64,
    seed: u64,
    config: Option<PathBuf>,
    mutation: Option<PathBuf>,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let components = load_components(config.as_deref())?;
    let weights = load_mutation_config(mutation.as_deref())?;
    let generator = GraphGenerator::new(rows, &components)?;
    let mutation = AgraphMutation::new(&components, weights)?;

    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let pb = ProgressBar::new(count);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} trials")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let stats = run_trials(&generator, &mutation, seed, count, pb.as_ref());
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    log::info!("sampled {} mutations in {:?}", stats.trials, start.elapsed());

    match format {
        OutputFormat::Text => print!("{}", format_text(&stats)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use symgraph::agraph::MutationConfig;

    #[test]
    fn test_stats_merge() {
        let mut a = SampleStats::default();
        a.record(MutationKind::Prune, true, 0);
        let mut b = SampleStats::default();
        b.record(MutationKind::Prune, false, -3);
        b.record(MutationKind::Node, false, 0);

        a.merge(&b);

        assert_eq!(a.trials, 3);
        assert_eq!(a.prune.applied, 2);
        assert_eq!(a.prune.unchanged, 1);
        assert_eq!(a.prune.complexity_delta, -3);
        assert_eq!(a.node.applied, 1);
    }

    #[test]
    fn test_progress_advances_per_trial() {
        let components = load_components(None).unwrap();
        let generator = GraphGenerator::new(8, &components).unwrap();
        let mutation = AgraphMutation::new(&components, MutationConfig::default()).unwrap();
        let pb = ProgressBar::hidden();

        let stats = run_trials(&generator, &mutation, 7, 40, Some(&pb));

        assert_eq!(stats.trials, 40);
        assert_eq!(pb.position(), 40);
    }

    #[test]
    fn test_text_report_lists_every_kind() {
        let text = format_text(&SampleStats::default());
        for name in ["command", "node", "parameter", "prune"] {
            assert!(text.contains(name));
        }
    }
}
