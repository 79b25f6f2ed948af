use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;

use crate::encoding::{read_failed, varint, MAGIC};
use crate::errdata;
use crate::error::Result;
use crate::key::Key;
use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use crate::tree::node::Node;
use crate::tree::RadixTree;

/// Loads a tree from a stream saved by [`super::writer::save`].
///
/// Returns the tree and the number of distinct interned keys. The tree is
/// built up privately and only handed out on success, so a failed load
/// leaves nothing observable behind. The caller keeps ownership of the
/// stream; trailing bytes are left unread.
pub fn load<K, S, R>(reader: &mut R) -> Result<(RadixTree<K, S>, usize)>
where
    K: Key,
    S: TreeStorage<K>,
    R: Read + ?Sized,
{
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(read_failed)?;
    if magic != MAGIC {
        return errdata!("bad magic {magic:02x?}");
    }
    let level = reader.read_i32::<LittleEndian>().map_err(read_failed)?;
    match level {
        0 => read_payload(reader),
        1..=9 => read_payload(&mut GzDecoder::new(reader)),
        other => errdata!("unknown compression code {other}"),
    }
}

fn read_payload<K, S, R>(reader: &mut R) -> Result<(RadixTree<K, S>, usize)>
where
    K: Key,
    S: TreeStorage<K>,
    R: Read + ?Sized,
{
    let interned = read_intern_table(reader)?;

    let root_edge_len = read_count(reader, "root edge length")?;
    if root_edge_len != 0 {
        return errdata!("root node with non-empty edge");
    }
    let root_key_count = read_count(reader, "root key count")?;
    if root_key_count != 0 {
        return errdata!("root node with keys");
    }
    let root_child_count = read_count(reader, "root child count")?;

    let root = S::Children::default();
    for _ in 0..root_child_count {
        let child: Node<K, S> = read_node(reader, &interned)?;
        root.insert(child.edge().into(), child);
    }

    tracing::debug!(keys = interned.len(), "loaded index");
    Ok((RadixTree::from_root(root), interned.len()))
}

fn read_intern_table<K: Key, R: Read + ?Sized>(reader: &mut R) -> Result<Vec<K>> {
    let count = read_count(reader, "intern table count")?;
    let mut interned = Vec::new();
    for _ in 0..count {
        let len = varint::read_u32(reader)? as usize;
        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes).map_err(read_failed)?;
        let text = String::from_utf8(bytes)?;
        interned.push(K::from_text(&text)?);
    }
    Ok(interned)
}

fn read_node<K, S, R>(reader: &mut R, interned: &[K]) -> Result<Node<K, S>>
where
    K: Key,
    S: TreeStorage<K>,
    R: Read + ?Sized,
{
    let edge_len = read_count(reader, "edge length")?;
    if edge_len == 0 {
        return errdata!("non-root node with empty edge");
    }
    let mut edge = vec![0u8; edge_len];
    reader.read_exact(&mut edge).map_err(read_failed)?;

    let key_count = read_count(reader, "key count")?;
    let child_count = read_count(reader, "child count")?;

    let keys = S::Bag::default();
    for _ in 0..key_count {
        let index = reader.read_i32::<LittleEndian>().map_err(read_failed)?;
        let key = usize::try_from(index)
            .ok()
            .and_then(|i| interned.get(i))
            .ok_or_else(|| {
                crate::error::Error::InvalidData(format!("intern index {index} out of range"))
            })?;
        keys.add(key.clone());
    }

    let edge: Box<[u8]> = edge.into();
    if child_count == 0 {
        return Ok(Node::Leaf { edge, keys });
    }

    let children = S::Children::default();
    for _ in 0..child_count {
        let child: Node<K, S> = read_node(reader, interned)?;
        children.insert(child.edge().into(), child);
    }

    if key_count == 0 {
        Ok(Node::NoKeysBranch { edge, children })
    } else {
        Ok(Node::KeysBranch { edge, keys, children })
    }
}

fn read_count<R: Read + ?Sized>(reader: &mut R, what: &str) -> Result<usize> {
    let value = reader.read_i32::<LittleEndian>().map_err(read_failed)?;
    usize::try_from(value).map_err(|_| {
        crate::error::Error::InvalidData(format!("negative {what}: {value}"))
    })
}
