use shaderlink_ir::{ShaderStage, STAGE_COUNT};

/// Hardware binding of an opaque uniform in one shader stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpaqueBinding {
    /// The stage references the uniform and a binding was assigned.
    pub active: bool,
    /// First hardware sampler unit of the uniform in this stage.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformStorageEntry {
    pub name: String,
    /// Element count for arrays, 0 for non-arrays.
    pub array_elements: u32,
    /// The uniform's base type is a shadow (depth-comparison) sampler.
    pub shadow: bool,
    pub opaque: [OpaqueBinding; STAGE_COUNT],
}

impl UniformStorageEntry {
    pub fn new(name: impl Into<String>, array_elements: u32) -> Self {
        Self {
            name: name.into(),
            array_elements,
            shadow: false,
            opaque: [OpaqueBinding::default(); STAGE_COUNT],
        }
    }

    /// Marks the uniform active in `stage`, starting at hardware unit `index`.
    pub fn with_binding(mut self, stage: ShaderStage, index: u32) -> Self {
        self.opaque[stage.index()] = OpaqueBinding {
            active: true,
            index,
        };
        self
    }

    pub fn with_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }
}

/// Per-program table of uniform storage, indexed by uniform location.
///
/// Filled in by the linker's uniform assignment and only read by lowering passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformStorage {
    entries: Vec<UniformStorageEntry>,
}

impl UniformStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its location.
    pub fn push(&mut self, entry: UniformStorageEntry) -> u32 {
        let location = self.entries.len() as u32;
        self.entries.push(entry);
        location
    }

    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn entry(&self, location: u32) -> Option<&UniformStorageEntry> {
        self.entries.get(location as usize)
    }

    pub fn lookup(&self, stage: ShaderStage, location: u32) -> Option<&OpaqueBinding> {
        self.entry(location).map(|entry| &entry.opaque[stage.index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &UniformStorageEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(location, entry)| (location as u32, entry))
    }
}

impl FromIterator<UniformStorageEntry> for UniformStorage {
    fn from_iter<I: IntoIterator<Item = UniformStorageEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
