//! Declarative signal graph
//!
//! A render is described as nodes plus directed connections and handed to
//! [`crate::render::executor::render_graph`]. Building a graph does no audio
//! work; it only records topology and parameters.
//!
//! ```text
//! Source ─► Gain (event) ─┬─► Gain (dry) ────────────────┐
//!                         └─► Convolver ─► Gain (wet) ───┴─► Gain (master) ─► Destination
//! ```

use crate::error::RemixError;

/// Index of a node in its graph
pub type NodeId = usize;

/// A clip placed on the timeline
#[derive(Debug, Clone)]
pub struct SourceNode<'a> {
    /// Planar clip data at the render sample rate
    pub channels: &'a [Vec<f32>],
    /// First output frame
    pub start_frame: usize,
    /// Frames to play from `start_frame`; when longer than the clip the
    /// source wraps if looping and falls silent otherwise
    pub span_frames: usize,
    /// Repeat the clip end-to-start to fill the span
    pub looping: bool,
}

/// Graph node
#[derive(Debug, Clone)]
pub enum Node<'a> {
    /// Clip playback
    Source(SourceNode<'a>),
    /// Constant linear gain
    Gain(f32),
    /// Stereo convolution with a fixed kernel
    Convolver {
        /// Planar kernel, one or two channels
        kernel: Vec<Vec<f32>>,
    },
    /// Render output
    Destination,
}

impl Node<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Node::Source(_) => "source",
            Node::Gain(_) => "gain",
            Node::Convolver { .. } => "convolver",
            Node::Destination => "destination",
        }
    }
}

/// Nodes and connections of one offline render
#[derive(Debug, Clone)]
pub struct SignalGraph<'a> {
    nodes: Vec<Node<'a>>,
    edges: Vec<(NodeId, NodeId)>,
}

impl<'a> Default for SignalGraph<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SignalGraph<'a> {
    /// Empty graph holding only the destination node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Destination],
            edges: Vec::new(),
        }
    }

    /// The destination node
    pub fn destination(&self) -> NodeId {
        0
    }

    /// Add a clip source
    pub fn add_source(&mut self, source: SourceNode<'a>) -> NodeId {
        self.push(Node::Source(source))
    }

    /// Add a gain stage
    pub fn add_gain(&mut self, gain: f32) -> NodeId {
        self.push(Node::Gain(gain))
    }

    /// Add a convolver
    pub fn add_convolver(&mut self, kernel: Vec<Vec<f32>>) -> NodeId {
        self.push(Node::Convolver { kernel })
    }

    fn push(&mut self, node: Node<'a>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Connect the output of `from` to an input of `to`
    ///
    /// # Errors
    ///
    /// `RenderError` for unknown ids, a destination used as an input, a
    /// source used as an output, or a duplicate connection
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), RemixError> {
        let (src, dst) = match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(src), Some(dst)) => (src, dst),
            _ => {
                return Err(RemixError::RenderError(format!(
                    "Cannot connect unknown node {} -> {}",
                    from, to
                )))
            }
        };
        if matches!(src, Node::Destination) || matches!(dst, Node::Source(_)) {
            return Err(RemixError::RenderError(format!(
                "Cannot connect {} -> {}",
                src.kind(),
                dst.kind()
            )));
        }
        if self.edges.contains(&(from, to)) {
            return Err(RemixError::RenderError(format!(
                "Nodes {} -> {} already connected",
                from, to
            )));
        }
        self.edges.push((from, to));
        Ok(())
    }

    /// Number of nodes, destination included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the destination exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&Node<'a>> {
        self.nodes.get(id)
    }

    /// Nodes feeding `id`
    pub fn inputs(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.iter().filter(move |e| e.1 == id).map(|e| e.0)
    }

    /// Number of connections leaving `id`
    pub fn fan_out(&self, id: NodeId) -> usize {
        self.edges.iter().filter(|e| e.0 == id).count()
    }

    /// Evaluation order (Kahn's algorithm), inputs before consumers
    ///
    /// # Errors
    ///
    /// `RenderError` if the graph has a cycle
    pub fn topological_order(&self) -> Result<Vec<NodeId>, RemixError> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for &(_, to) in &self.edges {
            in_degree[to] += 1;
        }

        let mut ready: Vec<NodeId> = (0..n).filter(|&i| in_degree[i] == 0).rev().collect();
        let mut order = Vec::with_capacity(n);
        while let Some(id) = ready.pop() {
            order.push(id);
            for &(from, to) in &self.edges {
                if from == id {
                    in_degree[to] -= 1;
                    if in_degree[to] == 0 {
                        ready.push(to);
                    }
                }
            }
        }

        if order.len() != n {
            return Err(RemixError::RenderError(
                "Signal graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }
}
