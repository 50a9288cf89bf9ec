use std::collections::HashMap;

use tracing::debug;

use crate::{
    error::Result,
    filters::{BoxBlur, Bright, Contrast, Dark, FilterSelection, Grayscale, Kernel, Sepia},
    frame::{PixelBuffer, Region},
};

/// Registry for the available pixel filters
///
/// Maps each `FilterSelection` to the kernel that implements it. `None` has no
/// kernel; applying it is a no-op.
pub struct FilterRegistry {
    kernels: HashMap<FilterSelection, Box<dyn Kernel>>,
}

impl FilterRegistry {
    /// Create a new registry with all built-in filters
    pub fn new() -> Self {
        let mut registry = Self {
            kernels: HashMap::new(),
        };
        registry.register_builtin_filters();
        registry
    }

    fn register_builtin_filters(&mut self) {
        self.kernels.insert(FilterSelection::Grayscale, Box::new(Grayscale));
        self.kernels.insert(FilterSelection::Sepia, Box::new(Sepia));
        self.kernels.insert(FilterSelection::Bright, Box::new(Bright));
        self.kernels.insert(FilterSelection::Dark, Box::new(Dark));
        self.kernels.insert(FilterSelection::Contrast, Box::new(Contrast));
        self.kernels.insert(FilterSelection::Blur, Box::new(BoxBlur::default()));
    }

    /// Get the kernel behind a selection, `None` for the pass-through filter
    pub fn get(&self, selection: FilterSelection) -> Option<&dyn Kernel> {
        self.kernels.get(&selection).map(|kernel| kernel.as_ref())
    }

    /// Apply the selected filter to `region` of `buffer`
    pub fn apply(&self, selection: FilterSelection, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        match self.get(selection) {
            Some(kernel) => {
                debug!("Applying {} filter to {}x{} region at y={}",
                       kernel.name(), region.width, region.height, region.y);
                kernel.apply(buffer, region)
            }
            None => Ok(()),
        }
    }

    /// All selectable filters in menu order, including `none`
    pub fn available_filters(&self) -> Vec<FilterSelection> {
        FilterSelection::ALL
            .into_iter()
            .filter(|selection| selection.is_none() || self.kernels.contains_key(selection))
            .collect()
    }

    /// Human-readable description of a selection
    pub fn describe(&self, selection: FilterSelection) -> &str {
        self.get(selection)
            .map(|kernel| kernel.description())
            .unwrap_or("No filter, the camera image as-is")
    }

    /// Number of registered kernels
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
