//! Demo graph: labeled nodes orbiting the window centre.

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::Rng;
use text_nodes::{AtlasRasterizer, GraphicsContext, TextNode, TextNodeProgram};

const WORDS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "node", "edge", "graph", "vertex", "Hub", "Leaf",
    "router-7", "db_main", "cache?", "api/v2", "worker#3", "Zeta", "omega!", "queue:in",
];

/// Scene parameters.
#[derive(Clone, Debug)]
pub struct SceneParams {
    pub initial_nodes: usize,
    /// Ring radii in pixels from the window centre.
    pub min_radius: f32,
    pub max_radius: f32,
    /// Angular speed in radians per second at the inner radius.
    pub spin: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            initial_nodes: 24,
            min_radius: 80.0,
            max_radius: 320.0,
            spin: 0.6,
        }
    }
}

struct SceneNode {
    label: TextNode,
    radius: f32,
    angle: f32,
}

impl SceneNode {
    fn position(&self) -> Vec2 {
        Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius
    }
}

pub struct Scene {
    params: SceneParams,
    nodes: Vec<SceneNode>,
    next_id: u32,
    pub paused: bool,
}

impl Scene {
    pub fn new(params: SceneParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            next_id: 1,
            paused: false,
        }
    }

    /// Adds the configured number of nodes.
    pub fn populate<C: GraphicsContext, R: AtlasRasterizer>(
        &mut self,
        program: &mut TextNodeProgram<C, R>,
    ) {
        for _ in 0..self.params.initial_nodes {
            self.add_node(program);
        }
    }

    pub fn add_node<C: GraphicsContext, R: AtlasRasterizer>(
        &mut self,
        program: &mut TextNodeProgram<C, R>,
    ) {
        let mut rng = rand::rng();
        let label = TextNode::new(self.next_id, random_label(&mut rng));
        self.next_id += 1;

        program.create_node(&label);
        log::debug!("added node {:?} {:?}", label.id, label.text);
        self.nodes.push(SceneNode {
            label,
            radius: rng.random_range(self.params.min_radius..self.params.max_radius),
            angle: rng.random::<f32>() * std::f32::consts::TAU,
        });
    }

    pub fn remove_random<C: GraphicsContext, R: AtlasRasterizer>(
        &mut self,
        program: &mut TextNodeProgram<C, R>,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let index = rand::rng().random_range(0..self.nodes.len());
        let node = self.nodes.swap_remove(index);
        program.remove_node(&node.label);
        log::debug!("removed node {:?}", node.label.id);
    }

    pub fn rename_random<C: GraphicsContext, R: AtlasRasterizer>(
        &mut self,
        program: &mut TextNodeProgram<C, R>,
    ) {
        let mut rng = rand::rng();
        if self.nodes.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.nodes.len());
        let node = &mut self.nodes[index];

        let mut renamed = TextNode::new(node.label.id.0, random_label(&mut rng));
        program.replace_properties(&node.label, &mut renamed);
        log::debug!("renamed {:?}: {:?} -> {:?}", renamed.id, node.label.text, renamed.text);
        node.label = renamed;
    }

    /// Advances the orbit and repositions every label.
    pub fn update<C: GraphicsContext, R: AtlasRasterizer>(
        &mut self,
        program: &mut TextNodeProgram<C, R>,
        dt: f32,
    ) {
        for node in &mut self.nodes {
            if !self.paused {
                // Inner rings spin faster.
                node.angle += self.params.spin * dt * self.params.min_radius / node.radius;
            }
            let position = node.position();
            program.position(&mut node.label, position);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn random_label(rng: &mut impl Rng) -> String {
    let word = WORDS.choose(rng).copied().unwrap_or("node");
    if rng.random_bool(0.3) {
        format!("{word}-{}", rng.random_range(0..100))
    } else {
        word.to_string()
    }
}
