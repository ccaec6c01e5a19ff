//! Per-frame render graph with automatic dependency resolution.
//!
//! The graph is rebuilt from scratch every frame: stages register their
//! textures and passes with declared read/write intent, `compile` derives a
//! topological execution order from those declarations, and `execute`
//! records the passes onto one command encoder in that order. Memory
//! barriers between passes are the GPU API's business; the graph's job is
//! ordering and transient-texture lifetime.

mod resource;

pub use resource::{ResourceHandle, TextureInfo};

use crate::resources::{TextureKey, TexturePool};
use crate::shaders::KernelSet;
use haze_core::{HazeError, Result};
use std::collections::HashMap;
use std::collections::VecDeque;

/// A pass's recorded GPU work, run once during [`RenderGraph::execute`].
pub type PassExec<'fr> = Box<dyn FnOnce(&mut PassExecContext<'_>) -> Result<()> + 'fr>;

struct TextureNode {
    info: TextureInfo,
    imported: bool,
    /// Execution-order indices of the first and last pass touching this
    /// texture, filled in by `compile`.
    first_use: usize,
    last_use: usize,
}

struct PassNode<'fr> {
    name: &'static str,
    reads: Vec<ResourceHandle>,
    writes: Vec<ResourceHandle>,
    exec: Option<PassExec<'fr>>,
}

/// Render graph for one frame of one camera.
pub struct RenderGraph<'fr> {
    textures: Vec<TextureNode>,
    passes: Vec<PassNode<'fr>>,
    execution_order: Vec<usize>,
    compiled: bool,
}

impl<'fr> RenderGraph<'fr> {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
            passes: Vec::new(),
            execution_order: Vec::new(),
            compiled: false,
        }
    }

    /// Register a transient texture owned by the graph for this frame.
    pub fn create_texture(&mut self, info: TextureInfo) -> ResourceHandle {
        let handle = ResourceHandle(self.textures.len());
        self.textures.push(TextureNode {
            info,
            imported: false,
            first_use: usize::MAX,
            last_use: 0,
        });
        handle
    }

    /// Register a texture owned by the host (e.g. the camera color target).
    /// The matching view must be supplied to [`execute`].
    ///
    /// [`execute`]: RenderGraph::execute
    pub fn import_texture(&mut self, info: TextureInfo) -> ResourceHandle {
        let handle = ResourceHandle(self.textures.len());
        self.textures.push(TextureNode {
            info,
            imported: true,
            first_use: usize::MAX,
            last_use: 0,
        });
        handle
    }

    /// Shape metadata of a registered texture.
    pub fn texture_info(&self, handle: ResourceHandle) -> &TextureInfo {
        &self.textures[handle.0].info
    }

    /// Add a pass with declared read/write intent and its recorded work.
    pub fn add_pass(
        &mut self,
        name: &'static str,
        reads: Vec<ResourceHandle>,
        writes: Vec<ResourceHandle>,
        exec: impl FnOnce(&mut PassExecContext<'_>) -> Result<()> + 'fr,
    ) {
        self.passes.push(PassNode {
            name,
            reads,
            writes,
            exec: Some(Box::new(exec)),
        });
        self.compiled = false;
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Pass names in execution order. Only meaningful after `compile`.
    pub fn pass_names_in_order(&self) -> Vec<&'static str> {
        self.execution_order
            .iter()
            .map(|&i| self.passes[i].name)
            .collect()
    }

    /// Resolve dependencies and determine the execution order.
    ///
    /// Edges follow the declared hazards: a read depends on the latest
    /// earlier write, a write depends on the latest earlier write and on
    /// every read since it. Kahn's algorithm with a FIFO queue keeps
    /// independent passes in insertion order.
    pub fn compile(&mut self) -> Result<()> {
        let n = self.passes.len();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        let mut last_writer: HashMap<ResourceHandle, usize> = HashMap::new();
        let mut readers_since_write: HashMap<ResourceHandle, Vec<usize>> = HashMap::new();

        for i in 0..n {
            for &resource in &self.passes[i].reads {
                if let Some(&writer) = last_writer.get(&resource) {
                    if writer != i {
                        adj[writer].push(i);
                        in_degree[i] += 1;
                    }
                }
                readers_since_write.entry(resource).or_default().push(i);
            }
            for &resource in &self.passes[i].writes {
                if let Some(&writer) = last_writer.get(&resource) {
                    if writer != i {
                        adj[writer].push(i);
                        in_degree[i] += 1;
                    }
                }
                if let Some(readers) = readers_since_write.get_mut(&resource) {
                    for &reader in readers.iter() {
                        if reader != i {
                            adj[reader].push(i);
                            in_degree[i] += 1;
                        }
                    }
                    readers.clear();
                }
                last_writer.insert(resource, i);
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != n {
            return Err(HazeError::Graph(
                "cyclic dependency between render passes".to_string(),
            ));
        }

        self.execution_order = order;
        self.compute_texture_lifetimes();
        self.compiled = true;

        log::trace!("render graph compiled: {:?}", self.pass_names_in_order());
        Ok(())
    }

    fn compute_texture_lifetimes(&mut self) {
        for node in &mut self.textures {
            node.first_use = usize::MAX;
            node.last_use = 0;
        }
        for (exec_idx, &pass_idx) in self.execution_order.iter().enumerate() {
            let pass = &self.passes[pass_idx];
            for &handle in pass.reads.iter().chain(&pass.writes) {
                let node = &mut self.textures[handle.0];
                node.first_use = node.first_use.min(exec_idx);
                node.last_use = node.last_use.max(exec_idx);
            }
        }
    }

    /// Record all passes onto `encoder` in compiled order.
    ///
    /// Transient textures are acquired from the pool at their first use and
    /// released after their last, so two transients with disjoint lifetimes
    /// may alias the same GPU memory. Handles listed in `keep` are not
    /// returned to the pool; their textures are handed back to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        kernels: &KernelSet,
        pool: &mut TexturePool,
        imports: &[(ResourceHandle, wgpu::TextureView)],
        keep: &[ResourceHandle],
    ) -> Result<Vec<(ResourceHandle, wgpu::Texture)>> {
        if !self.compiled {
            return Err(HazeError::Graph("graph executed before compile".to_string()));
        }

        let n_textures = self.textures.len();
        let mut views: Vec<Option<wgpu::TextureView>> = vec![None; n_textures];
        let mut textures: Vec<Option<(TextureKey, wgpu::Texture)>> =
            (0..n_textures).map(|_| None).collect();
        let infos: Vec<TextureInfo> = self.textures.iter().map(|t| t.info.clone()).collect();

        for (handle, view) in imports {
            if !self.textures[handle.0].imported {
                return Err(HazeError::Graph(format!(
                    "view supplied for non-imported texture '{}'",
                    self.textures[handle.0].info.label
                )));
            }
            views[handle.0] = Some(view.clone());
        }

        let order = std::mem::take(&mut self.execution_order);
        for (exec_idx, &pass_idx) in order.iter().enumerate() {
            // Bring transients first used by this pass to life.
            for (i, node) in self.textures.iter().enumerate() {
                if node.imported || node.first_use != exec_idx {
                    continue;
                }
                let key = TextureKey::from_info(&node.info);
                let texture = pool.acquire(&key, node.info.label);
                views[i] = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
                textures[i] = Some((key, texture));
            }

            let pass = &mut self.passes[pass_idx];
            log::trace!("executing pass '{}'", pass.name);
            if let Some(exec) = pass.exec.take() {
                let mut ctx = PassExecContext {
                    device,
                    queue,
                    encoder: &mut *encoder,
                    kernels,
                    resources: PassResources {
                        views: &views,
                        infos: &infos,
                    },
                };
                exec(&mut ctx)?;
            }

            // Release transients whose last use just passed.
            for (i, node) in self.textures.iter().enumerate() {
                if node.imported || node.last_use != exec_idx {
                    continue;
                }
                if keep.contains(&ResourceHandle(i)) {
                    continue;
                }
                if let Some((key, texture)) = textures[i].take() {
                    pool.release(key, texture);
                    views[i] = None;
                }
            }
        }

        let mut kept = Vec::with_capacity(keep.len());
        for &handle in keep {
            if let Some((_, texture)) = textures[handle.0].take() {
                kept.push((handle, texture));
            }
        }
        Ok(kept)
    }
}

impl Default for RenderGraph<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Context handed to a pass's recorded work during execution.
pub struct PassExecContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub kernels: &'a KernelSet,
    pub resources: PassResources<'a>,
}

/// Resolved texture views and shapes, indexed by handle.
pub struct PassResources<'a> {
    views: &'a [Option<wgpu::TextureView>],
    infos: &'a [TextureInfo],
}

impl<'a> PassResources<'a> {
    pub fn view(&self, handle: ResourceHandle) -> Result<&'a wgpu::TextureView> {
        self.views[handle.0]
            .as_ref()
            .ok_or_else(|| HazeError::ResourceNotFound(self.infos[handle.0].label.to_string()))
    }

    pub fn info(&self, handle: ResourceHandle) -> &'a TextureInfo {
        &self.infos[handle.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex_info(label: &'static str) -> TextureInfo {
        TextureInfo::d2(
            label,
            64,
            64,
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    #[test]
    fn orders_passes_by_declared_dependencies() {
        let mut graph = RenderGraph::new();
        let a = graph.create_texture(tex_info("a"));
        let b = graph.create_texture(tex_info("b"));

        // Registered consumer-first; compile must still run producer first.
        graph.add_pass("consumer", vec![a], vec![b], |_| Ok(()));
        graph.add_pass("producer", vec![], vec![a], |_| Ok(()));

        // The producer wrote after the consumer read (write-after-read
        // hazard), so registration order is preserved here...
        graph.compile().unwrap();
        assert_eq!(graph.pass_names_in_order(), vec!["consumer", "producer"]);

        // ...whereas a consumer registered after its producer reads the
        // produced contents.
        let mut graph = RenderGraph::new();
        let a = graph.create_texture(tex_info("a"));
        let b = graph.create_texture(tex_info("b"));
        graph.add_pass("producer", vec![], vec![a], |_| Ok(()));
        graph.add_pass("consumer", vec![a], vec![b], |_| Ok(()));
        graph.compile().unwrap();
        assert_eq!(graph.pass_names_in_order(), vec!["producer", "consumer"]);
    }

    #[test]
    fn read_write_chains_stay_sequential() {
        // scattering -> accumulation -> filter (in-place) -> integration,
        // as declared by the real stages.
        let mut graph = RenderGraph::new();
        let volume = graph.create_texture(tex_info("volume"));
        let accum = graph.create_texture(tex_info("accum"));
        let color = graph.import_texture(tex_info("color"));
        let output = graph.create_texture(tex_info("output"));

        graph.add_pass("scattering", vec![], vec![volume], |_| Ok(()));
        graph.add_pass("accumulation", vec![volume], vec![accum], |_| Ok(()));
        graph.add_pass("filter", vec![accum], vec![accum], |_| Ok(()));
        graph.add_pass("integration", vec![accum, color], vec![output], |_| Ok(()));
        graph.compile().unwrap();

        assert_eq!(
            graph.pass_names_in_order(),
            vec!["scattering", "accumulation", "filter", "integration"]
        );
    }

    #[test]
    fn detects_cycles() {
        let mut graph = RenderGraph::new();
        let a = graph.create_texture(tex_info("a"));
        let b = graph.create_texture(tex_info("b"));
        graph.add_pass("first", vec![b], vec![a], |_| Ok(()));
        graph.add_pass("second", vec![a], vec![b], |_| Ok(()));
        assert!(graph.compile().is_err());
    }

    #[test]
    fn independent_passes_keep_insertion_order() {
        let mut graph = RenderGraph::new();
        let a = graph.create_texture(tex_info("a"));
        let b = graph.create_texture(tex_info("b"));
        graph.add_pass("one", vec![], vec![a], |_| Ok(()));
        graph.add_pass("two", vec![], vec![b], |_| Ok(()));
        graph.compile().unwrap();
        assert_eq!(graph.pass_names_in_order(), vec!["one", "two"]);
    }
}
