//! Element-tree backend
//!
//! Every drawn tile becomes an image node positioned by percentages of its
//! level's container. Cropped tiles (collection thumbnails) get a clipping
//! wrapper so only their cell of the shared collection tile shows. The tree
//! can be serialised to HTML for hosts that render markup.

use crate::{
    core::{constants::STYLE_PRECISION, geo::Size},
    rendering::{
        drawer::{LevelHandle, RenderBackend, TileView},
        image::TileImage,
    },
    tiles::tile::Tile,
};
use fxhash::FxHashMap;
use std::{fmt::Write, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Container,
    /// Wrapper that hides whatever overflows it
    Clip,
    Image { src: String },
}

/// Absolute-position style; lengths are percentages of the parent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStyle {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: Option<f32>,
}

impl ElementStyle {
    fn filling() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub style: ElementStyle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Retained tree of positioned elements
#[derive(Debug)]
pub struct ElementTree {
    root: NodeId,
    nodes: FxHashMap<NodeId, Element>,
    next_id: u64,
}

impl ElementTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = FxHashMap::default();
        nodes.insert(
            root,
            Element {
                kind: ElementKind::Container,
                style: ElementStyle::filling(),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            root,
            nodes,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates a detached node
    pub fn create(&mut self, kind: ElementKind, style: ElementStyle) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Element {
                kind,
                style,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Appends `child` as the last (frontmost) child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` before `reference`; a missing reference appends
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> bool {
        if !self.nodes.contains_key(&child) {
            return false;
        }
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let index = reference
            .and_then(|reference| parent_node.children.iter().position(|&c| c == reference))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
        true
    }

    /// Detaches `id` from its parent and drops it with all its descendants
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|&child| child != id);
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(child_node) = self.nodes.remove(&child) {
                stack.extend(child_node.children);
            }
        }
        true
    }

    /// Serialises the subtree under the root as HTML
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        self.write_node(&mut html, self.root);
        html
    }

    fn write_node(&self, html: &mut String, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let overflow = match node.kind {
            ElementKind::Clip => "hidden",
            _ => "visible",
        };
        let mut style = format!(
            "position:absolute;overflow:{};left:{};top:{};width:{};height:{}",
            overflow,
            percent(node.style.left),
            percent(node.style.top),
            percent(node.style.width),
            percent(node.style.height),
        );
        if let Some(opacity) = node.style.opacity {
            let _ = write!(style, ";opacity:{}", opacity);
        }

        match &node.kind {
            ElementKind::Image { src } => {
                let _ = write!(html, "<img src=\"{}\" style=\"{}\">", escape(src), style);
            }
            ElementKind::Container | ElementKind::Clip => {
                let _ = write!(html, "<div style=\"{}\">", style);
                for &child in &node.children {
                    self.write_node(html, child);
                }
                html.push_str("</div>");
            }
        }
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage with fixed precision, e.g. `12.50000000%`
pub fn percent(value: f64) -> String {
    format!("{:.*}%", STYLE_PRECISION, value)
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Drawer that lays tiles out as positioned elements
#[derive(Debug)]
pub struct ElementDrawer {
    norm_height: f64,
    tree: ElementTree,
    levels: FxHashMap<LevelHandle, NodeId>,
    next_handle: u64,
}

impl ElementDrawer {
    pub fn new(norm_height: f64) -> Self {
        Self {
            norm_height,
            tree: ElementTree::new(),
            levels: FxHashMap::default(),
            next_handle: 0,
        }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Container node of a level
    pub fn level_node(&self, level: LevelHandle) -> Option<NodeId> {
        self.levels.get(&level).copied()
    }

    pub fn render_html(&self) -> String {
        self.tree.render_html()
    }

    fn new_level(&mut self) -> (LevelHandle, NodeId) {
        self.next_handle += 1;
        let handle = LevelHandle(self.next_handle);
        let node = self.tree.create(ElementKind::Container, ElementStyle::filling());
        self.levels.insert(handle, node);
        (handle, node)
    }

    /// Builds the node tree for one tile and returns its outermost node
    fn build_tile(&mut self, image: &TileImage, tile: &Tile) -> NodeId {
        let bounds = tile.bounds();
        let placed = ElementStyle {
            left: 100.0 * bounds.x,
            top: 100.0 * bounds.y / self.norm_height,
            width: 100.0 * bounds.width,
            height: 100.0 * bounds.height / self.norm_height,
            opacity: Some(tile.opacity()),
        };
        let kind = ElementKind::Image {
            src: image.src().to_string(),
        };

        match tile.crop() {
            Some(crop) => {
                // show only the crop: the image overflows a clipping wrapper
                let (image_width, image_height) = (image.width() as f64, image.height() as f64);
                let img = self.tree.create(
                    kind,
                    ElementStyle {
                        left: -100.0 * crop.x / crop.width,
                        top: -100.0 * crop.y / crop.height,
                        width: 100.0 * image_width / crop.width,
                        height: 100.0 * image_height / crop.height,
                        opacity: None,
                    },
                );
                let wrapper = self.tree.create(ElementKind::Clip, placed);
                self.tree.append_child(wrapper, img);
                wrapper
            }
            None => self.tree.create(kind, placed),
        }
    }
}

impl RenderBackend for ElementDrawer {
    fn draw_tile(&mut self, image: &Arc<TileImage>, tile: &mut Tile, level: LevelHandle) -> bool {
        if !image.is_complete() {
            log::warn!("attempting to draw incomplete image {}", image.src());
            return false;
        }
        let Some(container) = self.level_node(level) else {
            log::warn!("attempting to draw tile {} to a removed level", tile.address());
            return false;
        };

        if let Some(TileView::Element(previous)) = tile.view.take() {
            self.tree.remove(previous);
        }
        let node = self.build_tile(image, tile);
        self.tree.append_child(container, node);
        tile.view = Some(TileView::Element(node));
        true
    }

    fn add_level_on_top(&mut self) -> LevelHandle {
        let (handle, node) = self.new_level();
        let root = self.tree.root();
        self.tree.append_child(root, node);
        handle
    }

    fn add_level_behind(&mut self, existing: LevelHandle) -> LevelHandle {
        let reference = self.level_node(existing);
        if reference.is_none() {
            log::warn!("level {:?} is gone, adding new level on top", existing);
        }
        let (handle, node) = self.new_level();
        let root = self.tree.root();
        self.tree.insert_before(root, node, reference);
        handle
    }

    fn remove_level(&mut self, level: LevelHandle) {
        match self.levels.remove(&level) {
            Some(node) => {
                self.tree.remove(node);
            }
            None => log::warn!("attempting to remove unknown level {:?}", level),
        }
    }

    fn update_blend(&mut self, tile: &Tile, _level: LevelHandle, opacity: f32) {
        let Some(TileView::Element(node)) = tile.view() else {
            log::warn!("blending tile {} that was never drawn", tile.address());
            return;
        };
        if let Some(element) = self.tree.get_mut(*node) {
            element.style.opacity = Some(opacity.clamp(0.0, 1.0));
        }
    }

    fn update_fade(&mut self, level: LevelHandle, opacity: f32) {
        let Some(node) = self.level_node(level) else {
            log::warn!("fading unknown level {:?}", level);
            return;
        };
        if let Some(element) = self.tree.get_mut(node) {
            element.style.opacity = Some(opacity.clamp(0.0, 1.0));
        }
    }

    fn discard_tile(&mut self, tile: &mut Tile, _level: LevelHandle) {
        if let Some(TileView::Element(node)) = tile.view.take() {
            self.tree.remove(node);
        }
    }

    fn set_level_dimensions(&mut self, _level: LevelHandle, _dimensions: Size, _tiles: &[&Tile]) {
        // percentages already scale with the container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{address::TileAddress, dense::DenseSource};
    use image::RgbaImage;

    fn image(size: u32) -> Arc<TileImage> {
        Arc::new(TileImage::new("t/img.png", RgbaImage::new(size, size)))
    }

    #[test]
    fn test_percent_precision() {
        assert_eq!(percent(12.5), "12.50000000%");
        assert_eq!(percent(-100.0), "-100.00000000%");
    }

    #[test]
    fn test_tree_insert_and_remove() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let a = tree.create(ElementKind::Container, ElementStyle::default());
        let b = tree.create(ElementKind::Container, ElementStyle::default());
        let leaf = tree.create(ElementKind::Clip, ElementStyle::default());
        tree.append_child(root, a);
        tree.insert_before(root, b, Some(a));
        tree.append_child(a, leaf);
        assert_eq!(tree.get(root).unwrap().children(), &[b, a]);
        assert_eq!(tree.get(leaf).unwrap().parent(), Some(a));

        assert!(tree.remove(a));
        assert!(tree.get(leaf).is_none());
        assert_eq!(tree.get(root).unwrap().children(), &[b]);
        assert!(!tree.remove(root));
    }

    #[test]
    fn test_uncropped_tile_placement() {
        let source = DenseSource::new(512, 256, 256, 0, "t/", "png").unwrap();
        let mut tile = Tile::with_source(TileAddress::new(9, 1, 0), &source).unwrap();
        tile.set_opacity(0.25);
        let mut drawer = ElementDrawer::new(0.5);
        let level = drawer.add_level_on_top();
        assert!(drawer.draw_tile(&image(256), &mut tile, level));

        let Some(TileView::Element(node)) = tile.view() else {
            panic!("expected an element view");
        };
        let style = &drawer.tree().get(*node).unwrap().style;
        assert_eq!((style.left, style.top, style.width, style.height), (50.0, 0.0, 50.0, 100.0));
        assert_eq!(style.opacity, Some(0.25));

        drawer.update_blend(&tile, level, 1.0);
        assert_eq!(drawer.tree().get(*node).unwrap().style.opacity, Some(1.0));
    }

    #[test]
    fn test_discard_removes_node() {
        let source = DenseSource::new(256, 256, 256, 0, "t/", "png").unwrap();
        let mut tile = Tile::with_source(TileAddress::new(8, 0, 0), &source).unwrap();
        let mut drawer = ElementDrawer::new(1.0);
        let level = drawer.add_level_on_top();
        drawer.draw_tile(&image(256), &mut tile, level);
        let nodes = drawer.tree().len();

        drawer.discard_tile(&mut tile, level);
        assert!(!tile.has_view());
        assert_eq!(drawer.tree().len(), nodes - 1);
        assert!(drawer.tree().get(drawer.level_node(level).unwrap()).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_level_drops_its_tiles() {
        let source = DenseSource::new(256, 256, 256, 0, "t/", "png").unwrap();
        let mut tile = Tile::with_source(TileAddress::new(8, 0, 0), &source).unwrap();
        let mut drawer = ElementDrawer::new(1.0);
        let level = drawer.add_level_on_top();
        drawer.draw_tile(&image(256), &mut tile, level);

        drawer.remove_level(level);
        assert_eq!(drawer.tree().len(), 1);
        assert!(!drawer.draw_tile(&image(256), &mut tile, level));
    }
}
