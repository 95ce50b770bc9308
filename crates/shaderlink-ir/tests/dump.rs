use pretty_assertions::assert_eq;

use shaderlink_ir::{
    validate_shader, ArrayIndex, Builder, CfNode, Deref, Function, FunctionImpl, SamplerDim,
    Shader, ShaderStage, StructMember, TexInstr, TexOp, TexSrcKind, ValidationError, VarMode,
    Variable,
};

/// `uniform Material { sampler2D albedo; samplerCubeShadow shadow; } materials[2];` sampled as
/// `materials[1 + i].shadow` inside an `if`.
fn material_shader() -> Shader {
    let mut shader = Shader::new(ShaderStage::Vertex);
    let albedo = shader.types.sampler(SamplerDim::D2, false);
    let shadow = shader.types.sampler(SamplerDim::Cube, true);
    let material = shader.types.structure(
        "Material",
        vec![
            StructMember {
                name: "albedo".into(),
                ty: albedo,
            },
            StructMember {
                name: "shadow".into(),
                ty: shadow,
            },
        ],
    );
    let materials = shader.types.array(material, 2);
    let var = shader.variables.append(Variable {
        name: "materials".into(),
        ty: materials,
        mode: VarMode::Uniform,
        location: 3,
    });

    let (mut body, entry) = FunctionImpl::new();
    let (i, coord) = {
        let mut b = Builder::at_end(&mut body, entry);
        (b.input(0), b.imm_float(0.5))
    };
    let then_block = body.new_block();
    {
        let chain = Deref::var(var, materials)
            .index(&shader.types, 1, ArrayIndex::Indirect(i))
            .and_then(|d| d.field(&shader.types, 1))
            .unwrap();
        let mut b = Builder::at_end(&mut body, then_block);
        let mut tex = TexInstr::new(TexOp::Tex, SamplerDim::Cube, chain);
        tex.is_shadow = true;
        b.tex(tex.with_src(TexSrcKind::Coord, coord));
    }
    body.cf.push(CfNode::If {
        condition: i,
        accept: vec![CfNode::Block(then_block)],
        reject: vec![],
    });

    shader.functions.push(Function {
        name: "main".into(),
        body: Some(body),
    });
    shader.functions.push(Function {
        name: "helper".into(),
        body: None,
    });
    shader
}

#[test]
fn dump_nested_control_flow() {
    let shader = material_shader();
    assert_eq!(validate_shader(&shader), Ok(()));
    assert_eq!(
        shader.display().to_string(),
        "\
shader: vertex
decl_var Uniform Material[2] materials (location 3)
impl main {
  block b0:
    %0 = input 0
    %1 = imm 0.5
  if %0 {
    block b1:
      %2 = tex.tex %1 (coord), sampler materials[1 + %0].1
  }
}
decl_function helper
"
    );
}

#[test]
fn tex_instrs_walk_every_defined_function() {
    let shader = material_shader();
    let found: Vec<_> = shader
        .tex_instrs()
        .map(|(func, tex)| (func.name.as_str(), tex.dim, tex.is_lowered()))
        .collect();
    assert_eq!(found, vec![("main", SamplerDim::Cube, false)]);
}

#[test]
fn block_placed_twice_is_rejected() {
    let mut shader = material_shader();
    let body = shader.functions[0].body.as_mut().unwrap();
    let CfNode::If { accept, .. } = &body.cf[1] else {
        panic!("expected an if node");
    };
    let again = accept.clone();
    body.cf.extend(again);

    assert_eq!(
        validate_shader(&shader),
        Err(ValidationError::BlockVisitedTwice {
            function: "main".into(),
            block: 1,
        })
    );
}
