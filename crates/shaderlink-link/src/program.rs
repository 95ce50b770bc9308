use bitflags::bitflags;
use shaderlink_ir::{Shader, ShaderStage, STAGE_COUNT};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct StageMask: u8 {
        const VERTEX = 1 << 0;
        const TESS_CTRL = 1 << 1;
        const TESS_EVAL = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}

impl From<ShaderStage> for StageMask {
    fn from(stage: ShaderStage) -> Self {
        StageMask::from_bits_truncate(1 << stage.index())
    }
}

/// A program object: at most one linked shader per stage, plus the outcome of the last link.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub name: u32,
    shaders: [Option<Shader>; STAGE_COUNT],
    pub link_status: bool,
    pub info_log: String,
}

impl ShaderProgram {
    pub fn new(name: u32) -> Self {
        Self {
            name,
            shaders: Default::default(),
            link_status: false,
            info_log: String::new(),
        }
    }

    /// Installs `shader` for its stage, returning the shader it replaces.
    pub fn attach(&mut self, shader: Shader) -> Option<Shader> {
        let slot = &mut self.shaders[shader.stage.index()];
        slot.replace(shader)
    }

    pub fn detach(&mut self, stage: ShaderStage) -> Option<Shader> {
        self.shaders[stage.index()].take()
    }

    pub fn shader(&self, stage: ShaderStage) -> Option<&Shader> {
        self.shaders[stage.index()].as_ref()
    }

    pub fn stages(&self) -> StageMask {
        ShaderStage::ALL
            .into_iter()
            .filter(|stage| self.shaders[stage.index()].is_some())
            .fold(StageMask::empty(), |mask, stage| mask | StageMask::from(stage))
    }

    /// Present shaders in pipeline order.
    pub fn linked_shaders(&self) -> impl Iterator<Item = &Shader> {
        self.shaders.iter().flatten()
    }

    pub(crate) fn replace_all(&mut self, shaders: Vec<Shader>) {
        for shader in shaders {
            self.attach(shader);
        }
    }
}
