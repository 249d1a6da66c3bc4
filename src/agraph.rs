//! Acyclic command graphs and their genetic operators.
//!
//! An expression is stored as a flat list of commands. Each row is a
//! terminal (an input feature or a numerical constant) or an operator whose
//! operands name earlier rows; the last row is the output. Numerical
//! constants live in a side store that the commands index into, and a
//! constant that has not been assigned a value yet is *pending*.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  GraphGenerator │ Crossover │ Mutation │
//! ├─────────────────────────────────────┤
//! │         ComponentGenerator          │
//! ├─────────────────────────────────────┤
//! │  CommandGraph (commands + constants)│
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use symgraph::agraph::{
//!     AgraphCrossover, AgraphMutation, BasicComponentGenerator, ComponentConfig,
//!     GraphGenerator, MutationConfig,
//! };
//!
//! let mut rng = SmallRng::seed_from_u64(1);
//! let components = BasicComponentGenerator::new(&ComponentConfig::default())?;
//! let graphs = GraphGenerator::new(8, &components)?;
//! let mutation = AgraphMutation::new(&components, MutationConfig::default())?;
//! let crossover = AgraphCrossover::new(&components);
//!
//! let parent_1 = graphs.generate(&mut rng);
//! let parent_2 = graphs.generate(&mut rng);
//! let (child, _) = crossover.crossover(&parent_1, &parent_2, &mut rng)?;
//! let child = mutation.mutate(&child, &mut rng);
//! assert_eq!(child.len(), 8);
//! # Ok::<(), symgraph::Error>(())
//! ```

mod command;
mod component;
mod crossover;
mod generator;
mod graph;
mod mutation;
mod persistence;

pub use command::{BinaryOperator, Command, ConstantRef, Opcode, Operator, UnaryOperator};
pub use component::{BasicComponentGenerator, ComponentConfig, ComponentGenerator};
pub use crossover::AgraphCrossover;
pub use generator::GraphGenerator;
pub use graph::CommandGraph;
pub use mutation::{AgraphMutation, MutationConfig, MutationKind};
pub use persistence::{
    Checkpoint, FORMAT_VERSION, checkpoint_path, load_checkpoint, load_population,
    save_checkpoint, save_population,
};
