use std::io::Write;

use ahash::AHashMap;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::GzEncoder;

use crate::encoding::{varint, Compression, MAGIC};
use crate::errdata;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use crate::tree::node::Node;
use crate::tree::RadixTree;

/// Distinct keys in first-visit order, stringized for the stream head.
struct KeyInterner<K> {
    indices: AHashMap<K, i32>,
    strings: Vec<String>,
}

impl<K: Key> KeyInterner<K> {
    fn new() -> Self {
        Self { indices: AHashMap::new(), strings: Vec::new() }
    }

    fn intern(&mut self, key: &K) -> Result<i32> {
        if let Some(&index) = self.indices.get(key) {
            return Ok(index);
        }
        let index = i32::try_from(self.strings.len())
            .map_err(|_| Error::InvalidData("intern table exceeds format limit".to_string()))?;
        self.strings.push(key.to_text());
        self.indices.insert(key.clone(), index);
        Ok(index)
    }
}

/// Saves the tree to a stream.
///
/// The tree body is serialized to a scratch buffer first, collecting the
/// intern table along the way, so the table can sit at the front of the
/// stream with a known count. The caller keeps ownership of the stream.
pub fn save<K, S, W>(tree: &RadixTree<K, S>, writer: &mut W, compression: Compression) -> Result<()>
where
    K: Key,
    S: TreeStorage<K>,
    W: Write + ?Sized,
{
    let mut interner = KeyInterner::new();
    let mut body = Vec::new();
    write_root(&mut body, tree, &mut interner)?;

    writer.write_all(&MAGIC)?;
    writer.write_i32::<LittleEndian>(compression.level())?;
    match compression {
        Compression::None => write_payload(writer, &interner.strings, &body)?,
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(&mut *writer, flate2::Compression::default());
            write_payload(&mut encoder, &interner.strings, &body)?;
            encoder.finish()?;
        }
    }
    writer.flush()?;

    tracing::debug!(
        keys = interner.strings.len(),
        body_bytes = body.len(),
        ?compression,
        "saved index"
    );
    Ok(())
}

fn write_payload<W: Write + ?Sized>(writer: &mut W, strings: &[String], body: &[u8]) -> Result<()> {
    writer.write_i32::<LittleEndian>(count_i32(strings.len())?)?;
    for text in strings {
        varint::write_u32(writer, text.len() as u32)?;
        writer.write_all(text.as_bytes())?;
    }
    writer.write_all(body)?;
    Ok(())
}

fn write_root<K, S>(
    buf: &mut Vec<u8>,
    tree: &RadixTree<K, S>,
    interner: &mut KeyInterner<K>,
) -> Result<()>
where
    K: Key,
    S: TreeStorage<K>,
{
    let root = tree.root();
    let edges = root.edges();
    buf.write_i32::<LittleEndian>(0)?; // root edge length
    buf.write_i32::<LittleEndian>(0)?; // root key count
    buf.write_i32::<LittleEndian>(count_i32(edges.len())?)?;
    write_children::<K, S>(buf, root, &edges, interner)
}

fn write_node<K, S>(buf: &mut Vec<u8>, node: &Node<K, S>, interner: &mut KeyInterner<K>) -> Result<()>
where
    K: Key,
    S: TreeStorage<K>,
{
    let edge = node.edge();
    buf.write_i32::<LittleEndian>(count_i32(edge.len())?)?;
    buf.extend_from_slice(edge);

    let mut keys = Vec::new();
    if let Some(bag) = node.keys() {
        bag.for_each(&mut |key| keys.push(key.clone()));
    }
    let child_edges = node.children().map(|children| children.edges()).unwrap_or_default();

    buf.write_i32::<LittleEndian>(count_i32(keys.len())?)?;
    buf.write_i32::<LittleEndian>(count_i32(child_edges.len())?)?;
    for key in &keys {
        buf.write_i32::<LittleEndian>(interner.intern(key)?)?;
    }

    match node.children() {
        Some(children) => write_children::<K, S>(buf, children, &child_edges, interner),
        None => Ok(()),
    }
}

fn write_children<K, S>(
    buf: &mut Vec<u8>,
    children: &S::Children,
    edges: &[Box<[u8]>],
    interner: &mut KeyInterner<K>,
) -> Result<()>
where
    K: Key,
    S: TreeStorage<K>,
{
    // The count was written from the same snapshot; a vanished child means
    // a writer raced the save, which the format cannot represent.
    for edge in edges {
        match children.with(edge, |child| write_node(buf, child, interner)) {
            Some(result) => result?,
            None => return errdata!("index mutated during save"),
        }
    }
    Ok(())
}

fn count_i32(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::InvalidData("count exceeds format limit".to_string()))
}
