//! Compilation of descriptor script entries into executable thread stacks.
//!
//! A thread is the unit the execution engine schedules: a flat sequence of
//! blocks, each with literal arguments, nested reporter blocks, or nested
//! substacks. Threads are attached to the runtime object that owns the
//! originating descriptor, never correlated by position in the children
//! sequence, so interleaved watchers and lists cannot shift or drop a later
//! sprite's scripts.

use crate::{
    descriptor::ScriptEntry,
    error::{StageError, StageResult},
    graph::RuntimeObjectGraph,
};

/// A compiled, directly executable block sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Thread {
    /// Top-level blocks in execution order.
    pub blocks: Vec<Block>,
}

/// One executable block: opcode plus compiled arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Operation name as serialized on the wire.
    pub opcode: String,
    /// Arguments in wire order.
    pub args: Vec<BlockArg>,
}

/// One compiled block argument.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockArg {
    /// Plain literal (number, string, boolean…).
    Literal(serde_json::Value),
    /// Nested expression block evaluated for its value.
    Reporter(Box<Block>),
    /// Nested substack (a C-block body).
    Stack(Vec<Block>),
}

/// Compile one script entry's block list into a [`Thread`].
pub fn compile_script(entry: &ScriptEntry) -> StageResult<Thread> {
    Ok(Thread {
        blocks: compile_block_list(entry.blocks())?,
    })
}

/// Compile a raw block list. Each element must be an array whose first item
/// is the opcode string.
pub fn compile_block_list(raw: &[serde_json::Value]) -> StageResult<Vec<Block>> {
    raw.iter().map(compile_block).collect()
}

fn compile_block(value: &serde_json::Value) -> StageResult<Block> {
    let serde_json::Value::Array(items) = value else {
        return Err(StageError::descriptor(format!(
            "script block must be an array, got {value}"
        )));
    };
    let Some(serde_json::Value::String(opcode)) = items.first() else {
        return Err(StageError::descriptor(
            "script block must start with an opcode string",
        ));
    };

    let args = items[1..]
        .iter()
        .map(compile_arg)
        .collect::<StageResult<Vec<_>>>()?;

    Ok(Block {
        opcode: opcode.clone(),
        args,
    })
}

fn compile_arg(value: &serde_json::Value) -> StageResult<BlockArg> {
    match value {
        // An array starting with a string is an inline reporter block; any
        // other array is a substack. An empty array is an empty substack.
        serde_json::Value::Array(items) => match items.first() {
            Some(serde_json::Value::String(_)) => {
                Ok(BlockArg::Reporter(Box::new(compile_block(value)?)))
            }
            _ => Ok(BlockArg::Stack(compile_block_list(items)?)),
        },
        other => Ok(BlockArg::Literal(other.clone())),
    }
}

/// Build and attach thread stacks for every target in `graph`.
///
/// Stage scripts come from the stage's own entries; sprite scripts come from
/// each sprite's retained descriptor snapshot.
pub fn attach_threads(graph: &mut RuntimeObjectGraph) -> StageResult<()> {
    for entry in &graph.stage.scripts {
        let thread = compile_script(entry)?;
        graph.stage.stacks.push(thread);
    }

    for sprite in &mut graph.sprites {
        for entry in &sprite.descriptor.scripts {
            sprite.stacks.push(compile_script(entry)?);
        }
    }

    Ok(())
}
