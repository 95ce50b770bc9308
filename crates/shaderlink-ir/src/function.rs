use crate::arena::{Arena, Handle};
use crate::instr::{Instr, Value};

/// A straight-line run of instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub instrs: Vec<Value>,
}

/// Structured control flow. Every block appears exactly once in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CfNode {
    Block(Handle<Block>),
    If {
        condition: Value,
        accept: Vec<CfNode>,
        reject: Vec<CfNode>,
    },
    Loop {
        body: Vec<CfNode>,
    },
}

/// Body of a function: instruction and block storage plus the control-flow tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionImpl {
    pub instrs: Arena<Instr>,
    pub blocks: Arena<Block>,
    pub cf: Vec<CfNode>,
}

impl FunctionImpl {
    /// An empty body consisting of a single block.
    pub fn new() -> (Self, Handle<Block>) {
        let mut body = FunctionImpl::default();
        let entry = body.blocks.append(Block::default());
        body.cf.push(CfNode::Block(entry));
        (body, entry)
    }

    /// Allocates a block that is not yet placed in the control-flow tree.
    pub fn new_block(&mut self) -> Handle<Block> {
        self.blocks.append(Block::default())
    }

    /// Every block in structural order: program order, `accept` before `reject`, loop bodies
    /// once.
    pub fn blocks_in_order(&self) -> Vec<Handle<Block>> {
        fn walk(nodes: &[CfNode], out: &mut Vec<Handle<Block>>) {
            for node in nodes {
                match node {
                    CfNode::Block(block) => out.push(*block),
                    CfNode::If { accept, reject, .. } => {
                        walk(accept, out);
                        walk(reject, out);
                    }
                    CfNode::Loop { body } => walk(body, out),
                }
            }
        }

        let mut out = Vec::with_capacity(self.blocks.len());
        walk(&self.cf, &mut out);
        out
    }

    /// Instructions in structural order.
    pub fn instrs_in_order(&self) -> Vec<Value> {
        self.blocks_in_order()
            .into_iter()
            .filter_map(|block| self.blocks.get(block))
            .flat_map(|block| block.instrs.iter().copied())
            .collect()
    }

    /// Placed instructions that read `value`.
    pub fn uses_of(&self, value: Value) -> Vec<Value> {
        self.instrs_in_order()
            .into_iter()
            .filter(|&user| {
                self.instrs
                    .get(user)
                    .is_some_and(|instr| instr.sources().contains(&value))
            })
            .collect()
    }

    /// Conditions of `if` nodes, which read values without being instructions.
    pub fn if_conditions(&self) -> Vec<Value> {
        fn walk(nodes: &[CfNode], out: &mut Vec<Value>) {
            for node in nodes {
                match node {
                    CfNode::Block(_) => {}
                    CfNode::If {
                        condition,
                        accept,
                        reject,
                    } => {
                        out.push(*condition);
                        walk(accept, out);
                        walk(reject, out);
                    }
                    CfNode::Loop { body } => walk(body, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.cf, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// `None` for functions that are declared but never defined.
    pub body: Option<FunctionImpl>,
}
