//! Node-graph analysis shared by the compiler: joint flagging, parent
//! lookup, common root joint (§4.9.3 Step 2), and cycle detection.

use std::collections::{HashMap, HashSet};

use crate::error::{GltfError, Result};
use crate::root::{GLTFRoot, Skin};

/// Union of every `joints[]` entry across all skins.
pub fn flag_joint_nodes(root: &GLTFRoot) -> HashSet<usize> {
    root.skins.iter().flat_map(|skin| skin.joints.iter().copied()).collect()
}

/// Maps each node index to its parent, derived by scanning every node's
/// `children` array (glTF stores no parent pointer directly).
pub fn parent_map(root: &GLTFRoot) -> HashMap<usize, usize> {
    let mut parents = HashMap::new();
    for (i, node) in root.nodes.iter().enumerate() {
        for &child in &node.children {
            parents.insert(child, i);
        }
    }
    parents
}

/// `_FindCommonRootJoint`: starting from one of the skin's joints, climb
/// the parent chain while the parent is itself in the joint set, landing
/// on the highest ancestor still inside the skin.
pub fn find_common_root_joint(skin: &Skin, parent: &HashMap<usize, usize>) -> Option<usize> {
    let joint_set: HashSet<usize> = skin.joints.iter().copied().collect();
    let mut current = *skin.joints.first()?;
    while let Some(&p) = parent.get(&current) {
        if joint_set.contains(&p) {
            current = p;
        } else {
            break;
        }
    }
    Some(current)
}

/// Depth-first cycle check over every node's `children` edges.
pub fn check_no_cycles(path: &str, root: &GLTFRoot) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }
    let mut marks: HashMap<usize, Mark> = HashMap::new();

    fn visit(path: &str, root: &GLTFRoot, node: usize, marks: &mut HashMap<usize, Mark>) -> Result<()> {
        match marks.get(&node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(GltfError::CyclicGraph {
                    path: path.into(),
                    node,
                })
            }
            None => {}
        }
        marks.insert(node, Mark::InProgress);
        if let Some(gnode) = root.nodes.get(node) {
            for &child in &gnode.children {
                visit(path, root, child, marks)?;
            }
        }
        marks.insert(node, Mark::Done);
        Ok(())
    }

    for i in 0..root.nodes.len() {
        visit(path, root, i, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::GltfNode;

    #[test]
    fn detects_cycle() {
        let root = GLTFRoot {
            nodes: vec![
                GltfNode {
                    children: vec![1],
                    ..Default::default()
                },
                GltfNode {
                    children: vec![0],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert!(check_no_cycles("t.gltf", &root).is_err());
    }

    #[test]
    fn common_root_joint_is_the_highest_shared_ancestor() {
        let root = GLTFRoot {
            nodes: vec![
                GltfNode {
                    children: vec![1],
                    ..Default::default()
                },
                GltfNode {
                    children: vec![2],
                    ..Default::default()
                },
                GltfNode::default(),
            ],
            skins: vec![Skin {
                joints: vec![1, 2],
                ..Default::default()
            }],
            ..Default::default()
        };
        let parent = parent_map(&root);
        let root_joint = find_common_root_joint(&root.skins[0], &parent);
        assert_eq!(root_joint, Some(1));
    }
}
