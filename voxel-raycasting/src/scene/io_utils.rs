use cad_import::structure::PrimitiveType;

/// Decodes the given index list into triangles according to the primitive type. Returns None if
/// the primitive type does not describe triangles.
///
/// Every second triangle of a strip has its first two indices swapped, such that all triangles
/// share the winding order of the first one. Trailing indices that do not form a full triangle are
/// ignored.
///
/// # Arguments
/// * `primitive` - The primitive type, i.e., Triangles, TriangleFan or TriangleStrip.
/// * `indices` - The raw vertex indices.
pub fn decode_triangles(primitive: PrimitiveType, indices: &[u32]) -> Option<Vec<[u32; 3]>> {
    let triangles = match primitive {
        PrimitiveType::Triangles => indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        PrimitiveType::TriangleFan => match indices.split_first() {
            Some((center, rim)) => rim.windows(2).map(|w| [*center, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        PrimitiveType::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .collect(),
        _ => return None,
    };

    Some(triangles)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_triangles() {
        let indices = [0, 1, 2, 3, 4, 5, 6];
        assert_eq!(
            decode_triangles(PrimitiveType::Triangles, &indices),
            Some(vec![[0, 1, 2], [3, 4, 5]])
        );
    }

    #[test]
    fn test_decode_triangle_fan() {
        let indices = [0, 1, 2, 3, 4, 5];
        assert_eq!(
            decode_triangles(PrimitiveType::TriangleFan, &indices),
            Some(vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5]])
        );
        assert_eq!(
            decode_triangles(PrimitiveType::TriangleFan, &[]),
            Some(vec![])
        );
    }

    #[test]
    fn test_decode_triangle_strip() {
        let indices = [0, 1, 2, 3, 4];
        assert_eq!(
            decode_triangles(PrimitiveType::TriangleStrip, &indices),
            Some(vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]])
        );
    }
}
