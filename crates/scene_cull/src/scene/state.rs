//! Render state bundles
//!
//! A `GeoState` groups the attributes a drawable needs set before it is
//! drawn. Attributes left as `None` inherit from the global state, which is
//! what lets `apply` compute a minimal three-way diff.

/// Blending applied to fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled
    #[default]
    Off,
    /// Standard `src_alpha, one_minus_src_alpha` blending
    Alpha,
    /// Additive blending
    Additive,
}

/// Polygon face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceCulling {
    /// Draw both faces
    None,
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
}

/// Opaque texture handle owned by the graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Opaque material handle owned by the graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// A single attribute write emitted by `GeoState::apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Enable or disable lighting
    Lighting(bool),
    /// Set the blend mode
    Blend(BlendMode),
    /// Bind or unbind a texture
    Texture(Option<TextureId>),
    /// Bind or unbind a material
    Material(Option<MaterialId>),
    /// Set face culling
    FaceCulling(FaceCulling),
}

/// Fully resolved attribute values after inheritance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedState {
    /// Lighting enabled
    pub lighting: bool,
    /// Blend mode
    pub blend: BlendMode,
    /// Bound texture
    pub texture: Option<TextureId>,
    /// Bound material
    pub material: Option<MaterialId>,
    /// Face culling
    pub face_culling: FaceCulling,
}

impl Default for ResolvedState {
    fn default() -> Self {
        Self {
            lighting: true,
            blend: BlendMode::Off,
            texture: None,
            material: None,
            face_culling: FaceCulling::Back,
        }
    }
}

impl ResolvedState {
    /// Changes needed to move from `from` to `self`, in a fixed attribute order
    pub fn changes_from(&self, from: &ResolvedState) -> Vec<StateChange> {
        let mut changes = Vec::new();
        if self.lighting != from.lighting {
            changes.push(StateChange::Lighting(self.lighting));
        }
        if self.blend != from.blend {
            changes.push(StateChange::Blend(self.blend));
        }
        if self.texture != from.texture {
            changes.push(StateChange::Texture(self.texture));
        }
        if self.material != from.material {
            changes.push(StateChange::Material(self.material));
        }
        if self.face_culling != from.face_culling {
            changes.push(StateChange::FaceCulling(self.face_culling));
        }
        changes
    }
}

/// Render state bundle referenced by drawables
///
/// Bins compare states by arena identity, never by value: two `GeoState`s
/// with equal attributes are still distinct groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoState {
    /// Debug name
    pub name: String,
    /// Route drawables using this state to the transparent bin
    pub transparent: bool,
    /// Lighting override
    pub lighting: Option<bool>,
    /// Blend override
    pub blend: Option<BlendMode>,
    /// Texture override
    pub texture: Option<TextureId>,
    /// Material override
    pub material: Option<MaterialId>,
    /// Face culling override
    pub face_culling: Option<FaceCulling>,
}

impl GeoState {
    /// Create an opaque state that inherits every attribute
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Create a transparent, alpha-blended state
    pub fn transparent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transparent: true,
            blend: Some(BlendMode::Alpha),
            ..Default::default()
        }
    }

    /// Set the texture binding
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Set the material binding
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the lighting override
    pub fn with_lighting(mut self, enabled: bool) -> Self {
        self.lighting = Some(enabled);
        self
    }

    /// Set the blend override
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = Some(blend);
        self
    }

    /// Set the face culling override
    pub fn with_face_culling(mut self, face_culling: FaceCulling) -> Self {
        self.face_culling = Some(face_culling);
        self
    }

    /// Whether drawables with this state belong in the transparent bin
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Attribute values after falling back to `global`, then to defaults
    pub fn resolve(&self, global: Option<&GeoState>) -> ResolvedState {
        let base = global.map_or_else(ResolvedState::default, |g| g.resolve(None));
        ResolvedState {
            lighting: self.lighting.unwrap_or(base.lighting),
            blend: self.blend.unwrap_or(base.blend),
            texture: self.texture.or(base.texture),
            material: self.material.or(base.material),
            face_culling: self.face_culling.unwrap_or(base.face_culling),
        }
    }

    /// Attribute writes needed to make this state current
    ///
    /// `previous` is the state applied immediately before; when `None` the
    /// global state is assumed current.
    pub fn apply(&self, global: Option<&GeoState>, previous: Option<&GeoState>) -> Vec<StateChange> {
        let from = previous.map_or_else(|| Self::resolve_global(global), |p| p.resolve(global));
        self.resolve(global).changes_from(&from)
    }

    /// Resolved values of the global state alone
    pub fn resolve_global(global: Option<&GeoState>) -> ResolvedState {
        global.map_or_else(ResolvedState::default, |g| g.resolve(None))
    }
}
