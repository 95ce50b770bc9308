use crate::arena::Handle;
use crate::function::{Block, FunctionImpl};
use crate::instr::{AluOp, Instr, Literal, TexInstr, Value};

/// Insertion point inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub block: Handle<Block>,
    pub index: usize,
}

impl Cursor {
    /// Before the instruction currently at `index` of `block`.
    pub fn before(block: Handle<Block>, index: usize) -> Self {
        Cursor { block, index }
    }

    pub fn end_of(body: &FunctionImpl, block: Handle<Block>) -> Self {
        let index = body.blocks.get(block).map_or(0, |b| b.instrs.len());
        Cursor { block, index }
    }
}

/// Appends instructions to a function body at a cursor.
///
/// Each insertion advances the cursor past the new instruction, so a sequence of calls emits
/// instructions in call order.
pub struct Builder<'a> {
    body: &'a mut FunctionImpl,
    cursor: Cursor,
}

impl<'a> Builder<'a> {
    pub fn new(body: &'a mut FunctionImpl, cursor: Cursor) -> Self {
        Builder { body, cursor }
    }

    pub fn at_end(body: &'a mut FunctionImpl, block: Handle<Block>) -> Self {
        let cursor = Cursor::end_of(body, block);
        Builder { body, cursor }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn body(&self) -> &FunctionImpl {
        self.body
    }

    pub fn insert(&mut self, instr: Instr) -> Value {
        let value = self.body.instrs.append(instr);
        let block = &mut self.body.blocks[self.cursor.block];
        let index = self.cursor.index.min(block.instrs.len());
        block.instrs.insert(index, value);
        self.cursor.index = index + 1;
        value
    }

    pub fn imm_int(&mut self, value: i32) -> Value {
        self.insert(Instr::Const(Literal::I32(value)))
    }

    pub fn imm_float(&mut self, value: f32) -> Value {
        self.insert(Instr::Const(Literal::F32(value)))
    }

    pub fn input(&mut self, location: u32) -> Value {
        self.insert(Instr::Input { location })
    }

    pub fn alu(&mut self, op: AluOp, srcs: Vec<Value>) -> Value {
        self.insert(Instr::Alu { op, srcs })
    }

    pub fn iadd(&mut self, a: Value, b: Value) -> Value {
        self.alu(AluOp::IAdd, vec![a, b])
    }

    pub fn imul(&mut self, a: Value, b: Value) -> Value {
        self.alu(AluOp::IMul, vec![a, b])
    }

    pub fn tex(&mut self, tex: TexInstr) -> Value {
        self.insert(Instr::Tex(tex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_past_each_insertion() {
        let (mut body, entry) = FunctionImpl::new();
        let last = {
            let mut b = Builder::at_end(&mut body, entry);
            b.input(7)
        };

        let (x, y) = {
            let mut b = Builder::new(&mut body, Cursor::before(entry, 0));
            let x = b.imm_int(2);
            let y = b.imul(x, x);
            assert_eq!(b.cursor(), Cursor::before(entry, 2));
            (x, y)
        };

        assert_eq!(body.blocks[entry].instrs, vec![x, y, last]);
    }
}
