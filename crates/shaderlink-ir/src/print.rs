//! Human-readable IR dumps.

use std::fmt::{self, Write};

use crate::deref::{ArrayIndex, Deref, DerefKind};
use crate::function::{CfNode, FunctionImpl};
use crate::instr::{Instr, Literal, TexInstr};
use crate::types::{ArraySize, Type, TypeInner, Types};
use crate::{Arena, Handle, Shader, Variable};

pub struct ShaderDisplay<'a> {
    shader: &'a Shader,
}

impl Shader {
    /// Returns a value that formats the whole shader.
    pub fn display(&self) -> ShaderDisplay<'_> {
        ShaderDisplay { shader: self }
    }
}

impl fmt::Display for ShaderDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shader = self.shader;
        writeln!(f, "shader: {}", shader.stage)?;
        for (_, var) in shader.variables.iter() {
            writeln!(
                f,
                "decl_var {:?} {} {} (location {})",
                var.mode,
                type_name(&shader.types, var.ty),
                var.name,
                var.location
            )?;
        }
        for func in &shader.functions {
            match &func.body {
                None => writeln!(f, "decl_function {}", func.name)?,
                Some(body) => {
                    writeln!(f, "impl {} {{", func.name)?;
                    write_cf(f, shader, body, &body.cf, 1)?;
                    writeln!(f, "}}")?;
                }
            }
        }
        Ok(())
    }
}

pub fn type_name(types: &Types, ty: Handle<Type>) -> String {
    let Some(t) = types.get(ty) else {
        return format!("<bad type {ty}>");
    };
    match &t.inner {
        TypeInner::Scalar(kind) => format!("{kind:?}").to_lowercase(),
        TypeInner::Vector { kind, size } => format!("{}vec{size}", scalar_prefix(*kind)),
        TypeInner::Sampler { dim, shadow, .. } => {
            format!("sampler{dim:?}{}", if *shadow { "Shadow" } else { "" })
        }
        TypeInner::Array { base, size } => match size {
            ArraySize::Constant(len) => format!("{}[{len}]", type_name(types, *base)),
            ArraySize::Runtime => format!("{}[]", type_name(types, *base)),
        },
        TypeInner::Struct { .. } => t.name.clone().unwrap_or_else(|| format!("struct{ty}")),
    }
}

fn scalar_prefix(kind: crate::ScalarKind) -> &'static str {
    match kind {
        crate::ScalarKind::Bool => "b",
        crate::ScalarKind::Int => "i",
        crate::ScalarKind::Uint => "u",
        crate::ScalarKind::Float => "",
    }
}

fn write_cf(
    f: &mut fmt::Formatter<'_>,
    shader: &Shader,
    body: &FunctionImpl,
    nodes: &[CfNode],
    depth: usize,
) -> fmt::Result {
    let pad = "  ".repeat(depth);
    for node in nodes {
        match node {
            CfNode::Block(block) => {
                writeln!(f, "{pad}block b{block}:")?;
                let Some(b) = body.blocks.get(*block) else {
                    continue;
                };
                for &value in &b.instrs {
                    match body.instrs.get(value) {
                        Some(instr) => {
                            writeln!(f, "{pad}  %{value} = {}", instr_text(shader, instr))?
                        }
                        None => writeln!(f, "{pad}  %{value} = <missing>")?,
                    }
                }
            }
            CfNode::If {
                condition,
                accept,
                reject,
            } => {
                writeln!(f, "{pad}if %{condition} {{")?;
                write_cf(f, shader, body, accept, depth + 1)?;
                if !reject.is_empty() {
                    writeln!(f, "{pad}}} else {{")?;
                    write_cf(f, shader, body, reject, depth + 1)?;
                }
                writeln!(f, "{pad}}}")?;
            }
            CfNode::Loop { body: inner } => {
                writeln!(f, "{pad}loop {{")?;
                write_cf(f, shader, body, inner, depth + 1)?;
                writeln!(f, "{pad}}}")?;
            }
        }
    }
    Ok(())
}

fn instr_text(shader: &Shader, instr: &Instr) -> String {
    match instr {
        Instr::Const(Literal::I32(v)) => format!("imm {v}"),
        Instr::Const(Literal::F32(v)) => format!("imm {v:?}"),
        Instr::Input { location } => format!("input {location}"),
        Instr::Alu { op, srcs } => {
            let args: Vec<String> = srcs.iter().map(|s| format!("%{s}")).collect();
            format!("{} {}", op.name(), args.join(", "))
        }
        Instr::Tex(tex) => tex_text(shader, tex),
    }
}

fn tex_text(shader: &Shader, tex: &TexInstr) -> String {
    let mut out = format!("tex.{}", tex.op.name());
    for (i, src) in tex.srcs.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let _ = write!(out, "{sep}%{} ({})", src.value, src.kind.name());
    }
    match &tex.sampler {
        Some(chain) => {
            let _ = write!(out, ", sampler {}", deref_text(&shader.variables, chain));
        }
        None => {
            let _ = write!(out, ", sampler_index {}", tex.sampler_index);
            if tex.sampler_array_size != 0 {
                let _ = write!(out, ", sampler_array_size {}", tex.sampler_array_size);
            }
        }
    }
    out
}

pub fn deref_text(variables: &Arena<Variable>, chain: &Deref) -> String {
    let mut out = String::new();
    for node in chain.iter() {
        match node.kind {
            DerefKind::Var(var) => match variables.get(var) {
                Some(v) => out.push_str(&v.name),
                None => {
                    let _ = write!(out, "<var {var}>");
                }
            },
            DerefKind::Array(array) => {
                let _ = match array.index {
                    ArrayIndex::Direct => write!(out, "[{}]", array.base_offset),
                    ArrayIndex::Indirect(value) => {
                        write!(out, "[{} + %{value}]", array.base_offset)
                    }
                    ArrayIndex::Wildcard => write!(out, "[*]"),
                };
            }
            DerefKind::Struct { member } => {
                let _ = write!(out, ".{member}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builder, Function, SamplerDim, ShaderStage, TexOp, TexSrcKind, VarMode};

    #[test]
    fn dump_shows_symbolic_and_lowered_samplers() {
        let mut shader = Shader::new(ShaderStage::Fragment);
        let s = shader.types.sampler(SamplerDim::D2, false);
        let arr = shader.types.array(s, 4);
        let var = shader.variables.append(Variable {
            name: "tex".into(),
            ty: arr,
            mode: VarMode::Uniform,
            location: 0,
        });

        let (mut body, entry) = FunctionImpl::new();
        {
            let mut b = Builder::at_end(&mut body, entry);
            let i = b.input(0);
            let coord = b.imm_float(0.5);
            let chain = Deref::var(var, arr)
                .index(&shader.types, 1, ArrayIndex::Indirect(i))
                .unwrap();
            b.tex(
                TexInstr::new(TexOp::Tex, SamplerDim::D2, chain)
                    .with_src(TexSrcKind::Coord, coord),
            );
        }
        shader.functions.push(Function {
            name: "main".into(),
            body: Some(body),
        });

        let text = shader.display().to_string();
        assert!(text.contains("shader: fragment"), "{text}");
        assert!(text.contains("decl_var Uniform samplerD2[4] tex (location 0)"), "{text}");
        assert!(
            text.contains("%2 = tex.tex %1 (coord), sampler tex[1 + %0]"),
            "{text}"
        );
    }
}
