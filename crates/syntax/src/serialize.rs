//! Tree serialization over an object stream.
//!
//! Layout, per element in pre-order:
//!
//! ```text
//! node   := RECORD_NODE kind:u16 child_count:varint element* annotation_count:varint object*
//! token  := RECORD_TOKEN kind:u16 text:string
//! shared := RECORD_SHARED index:varint
//! ```
//!
//! Every completed node is numbered in completion order. When the same
//! node allocation appears again in the tree it is written as a `shared`
//! record naming that number, and the reader reuses the node it already
//! built. Annotations are opaque objects under [`Annotation::MARKER`].

use std::io::{Read, Write};
use std::sync::Arc;

use arbor_stream::{MarkerRegistry, ObjectReader, ObjectWriter, StreamConfig, StreamError};
use rustc_hash::FxHashMap;

use crate::annotation::Annotation;
use crate::error::{Result, SyntaxError};
use crate::factory::{GreenFactory, NodeFactory};
use crate::kind::SyntaxKind;
use crate::node::{SyntaxElement, SyntaxNode};

const RECORD_NODE: u8 = 0;
const RECORD_TOKEN: u8 = 1;
const RECORD_SHARED: u8 = 2;

/// Registers the object types a serialized tree may contain.
pub fn register_markers(registry: &mut MarkerRegistry) {
	registry.register::<Annotation>();
}

/// Writes syntax trees to object streams and reads them back.
#[derive(Debug)]
pub struct TreeSerializer<F = GreenFactory> {
	config: StreamConfig,
	registry: MarkerRegistry,
	factory: F,
}

impl TreeSerializer<GreenFactory> {
	pub fn new() -> Self {
		Self::with_factory(GreenFactory)
	}
}

impl Default for TreeSerializer<GreenFactory> {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: NodeFactory> TreeSerializer<F> {
	/// Creates a serializer that rebuilds trees through `factory`.
	pub fn with_factory(factory: F) -> Self {
		let mut registry = MarkerRegistry::with_builtins();
		register_markers(&mut registry);
		Self {
			config: StreamConfig::default(),
			registry,
			factory,
		}
	}

	/// Replaces the stream configuration.
	pub fn with_config(mut self, config: StreamConfig) -> Self {
		self.config = config;
		self
	}

	pub fn config(&self) -> &StreamConfig {
		&self.config
	}

	/// Registry handed to readers; hosts may add their own object types.
	pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
		&mut self.registry
	}

	/// Writes `node` as a complete stream and returns the bytes written.
	pub fn serialize(&self, node: &SyntaxNode, sink: &mut dyn Write) -> Result<u64> {
		let mut writer = ObjectWriter::with_config(sink, self.config)?;
		self.write_tree(node, &mut writer)?;
		Ok(writer.finish()?)
	}

	/// Reads a complete stream written by [`serialize`](Self::serialize).
	pub fn deserialize(&self, source: &mut dyn Read) -> Result<SyntaxNode> {
		let mut reader = ObjectReader::with_config(source, &self.registry, self.config)?;
		self.read_tree(&mut reader)
	}

	/// Writes `node` into an already open stream.
	pub fn write_tree(&self, node: &SyntaxNode, writer: &mut ObjectWriter<'_>) -> Result<()> {
		let mut state = WriteState::default();
		self.write_node(node, writer, &mut state, 0)?;
		tracing::debug!(
			nodes = state.completed,
			shared = state.shared_hits,
			"syntax tree serialized"
		);
		Ok(())
	}

	/// Reads one tree from an already open stream.
	pub fn read_tree(&self, reader: &mut ObjectReader<'_>) -> Result<SyntaxNode> {
		let mut completed = Vec::new();
		match reader.read_u8()? {
			RECORD_NODE => self.read_node_body(reader, &mut completed, 0),
			RECORD_SHARED => Err(SyntaxError::InvalidBackReference {
				index: reader.read_varint()?,
				available: 0,
			}),
			other => Err(SyntaxError::InvalidRecord(other)),
		}
	}

	fn write_node(
		&self,
		node: &SyntaxNode,
		writer: &mut ObjectWriter<'_>,
		state: &mut WriteState,
		depth: u32,
	) -> Result<()> {
		if let Some(&index) = state.completed_ids.get(&node.identity()) {
			tracing::trace!(index, "shared subtree");
			state.shared_hits += 1;
			writer.write_u8(RECORD_SHARED)?;
			writer.write_varint(u64::from(index))?;
			return Ok(());
		}
		self.check_depth(depth)?;

		writer.write_u8(RECORD_NODE)?;
		writer.write_u16(node.kind().as_u16())?;
		writer.write_varint(node.children().len() as u64)?;
		for child in node.children() {
			match child {
				SyntaxElement::Node(child) => self.write_node(child, writer, state, depth + 1)?,
				SyntaxElement::Token(token) => {
					writer.write_u8(RECORD_TOKEN)?;
					writer.write_u16(token.kind().as_u16())?;
					writer.write_string(token.text())?;
				}
			}
		}

		let annotations = node.annotations();
		writer.write_varint(annotations.len() as u64)?;
		for annotation in annotations {
			writer.write_object(annotation)?;
		}

		state.completed_ids.insert(node.identity(), state.completed);
		state.completed += 1;
		Ok(())
	}

	fn read_node_body(
		&self,
		reader: &mut ObjectReader<'_>,
		completed: &mut Vec<SyntaxNode>,
		depth: u32,
	) -> Result<SyntaxNode> {
		self.check_depth(depth)?;
		let kind = SyntaxKind(reader.read_u16()?);

		let child_count = reader.read_varint()?;
		let mut children = Vec::with_capacity(child_count.min(256) as usize);
		for _ in 0..child_count {
			let child = match reader.read_u8()? {
				RECORD_NODE => SyntaxElement::Node(self.read_node_body(reader, completed, depth + 1)?),
				RECORD_TOKEN => {
					let kind = SyntaxKind(reader.read_u16()?);
					let text: Arc<str> = reader.read_shared_string()?;
					SyntaxElement::Token(self.factory.create_token(kind, text))
				}
				RECORD_SHARED => {
					let index = reader.read_varint()?;
					let node = usize::try_from(index)
						.ok()
						.and_then(|i| completed.get(i))
						.cloned()
						.ok_or(SyntaxError::InvalidBackReference {
							index,
							available: completed.len(),
						})?;
					SyntaxElement::Node(node)
				}
				other => return Err(SyntaxError::InvalidRecord(other)),
			};
			children.push(child);
		}

		let mut node = self.factory.create_node(kind, children);

		let annotation_count = reader.read_varint()?;
		if annotation_count > 0 {
			let mut annotations = Vec::with_capacity(annotation_count.min(16) as usize);
			for _ in 0..annotation_count {
				annotations.push(reader.read_object::<Annotation>()?);
			}
			node = node.with_additional_annotations(annotations);
		}

		completed.push(node.clone());
		Ok(node)
	}

	fn check_depth(&self, depth: u32) -> Result<()> {
		if depth >= self.config.max_depth {
			return Err(StreamError::DepthLimitExceeded {
				limit: self.config.max_depth,
			}
			.into());
		}
		Ok(())
	}
}

#[derive(Default)]
struct WriteState {
	/// Node allocation address to completion index.
	completed_ids: FxHashMap<usize, u32>,
	completed: u32,
	shared_hits: u32,
}

impl SyntaxNode {
	/// Writes this tree as a complete stream with default settings.
	pub fn serialize_to(&self, sink: &mut dyn Write) -> Result<u64> {
		TreeSerializer::new().serialize(self, sink)
	}

	/// Reads a tree written by [`serialize_to`](Self::serialize_to).
	pub fn deserialize_from(source: &mut dyn Read) -> Result<SyntaxNode> {
		TreeSerializer::new().deserialize(source)
	}
}

#[cfg(test)]
mod tests;
