// Projection CSV adapter: `source,target,weight,type` with fixed 4-decimal weights.

use std::fmt::Write;
use std::path::Path;

use crate::contracts::projection_csv::{COLUMNS, HEADER, WEIGHT_DECIMALS};
use crate::error::ArtifactError;
use crate::types::{EdgeKind, NodeId, ProjectedEdge, WeightedProjection};

/// Render the projection as CSV text.
pub fn to_csv(projection: &WeightedProjection) -> String {
    let mut out = String::with_capacity(projection.len() * 32 + HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');
    for edge in projection.edges() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{:.prec$},{}",
            edge.source,
            edge.target,
            edge.weight,
            edge.kind,
            prec = WEIGHT_DECIMALS
        );
    }
    out
}

/// Parse CSV text produced by [`to_csv`]. `artifact` is only used in errors.
pub fn parse_csv(text: &str, artifact: &Path) -> Result<WeightedProjection, ArtifactError> {
    let malformed = |line: usize, message: String| ArtifactError::Malformed {
        artifact: artifact.to_path_buf(),
        message: format!("line {line}: {message}"),
    };

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    match lines.next() {
        Some((_, header)) if header == HEADER => {}
        Some((line, header)) => {
            return Err(malformed(line, format!("expected header `{HEADER}`, got `{header}`")));
        }
        None => return Err(malformed(0, "empty file".into())),
    }

    let mut edges = Vec::new();
    for (line, row) in lines {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS {
            return Err(malformed(
                line,
                format!("expected {COLUMNS} columns, got {}", fields.len()),
            ));
        }

        let source: NodeId = fields[0]
            .parse()
            .map_err(|e| malformed(line, format!("source: {e}")))?;
        let target: NodeId = fields[1]
            .parse()
            .map_err(|e| malformed(line, format!("target: {e}")))?;
        let weight: f64 = fields[2]
            .parse()
            .map_err(|e| malformed(line, format!("weight: {e}")))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(malformed(
                line,
                format!("weight must be finite and >= 0, got {weight}"),
            ));
        }
        let kind: EdgeKind = fields[3].parse().map_err(|e| malformed(line, e))?;

        edges.push(ProjectedEdge {
            source,
            target,
            weight,
            kind,
        });
    }

    Ok(WeightedProjection::new(edges))
}

pub fn write_projection(path: &Path, projection: &WeightedProjection) -> Result<(), ArtifactError> {
    super::ensure_parent(path)?;
    std::fs::write(path, to_csv(projection))?;
    Ok(())
}

pub fn read_projection(path: &Path) -> Result<WeightedProjection, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeightedProjection {
        WeightedProjection::new(vec![
            ProjectedEdge {
                source: NodeId(102),
                target: NodeId(101),
                weight: 1.0,
                kind: EdgeKind::Structural,
            },
            ProjectedEdge {
                source: NodeId(101),
                target: NodeId(102),
                weight: 0.493_456_7,
                kind: EdgeKind::Semantic,
            },
        ])
    }

    #[test]
    fn writes_fixed_precision() {
        let csv = to_csv(&sample());
        assert_eq!(
            csv,
            "source,target,weight,type\n102,101,1.0000,structural\n101,102,0.4935,semantic\n"
        );
    }

    #[test]
    fn reread_is_stable() {
        let path = Path::new("mem.csv");
        let first = parse_csv(&to_csv(&sample()), path).unwrap();
        assert!((first.edges()[1].weight - 0.4935).abs() < 1e-12);
        // A second write of the re-read projection is byte-identical.
        assert_eq!(to_csv(&first), to_csv(&parse_csv(&to_csv(&first), path).unwrap()));
    }

    #[test]
    fn accepts_float_encoded_ids() {
        let text = "source,target,weight,type\n102.0,101.0,1.0,structural\n";
        let projection = parse_csv(text, Path::new("x.csv")).unwrap();
        assert_eq!(projection.edges()[0].source, NodeId(102));
    }

    #[test]
    fn rejects_bad_header() {
        let err = parse_csv("src,dst\n1,2\n", Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed { .. }));
    }

    #[test]
    fn rejects_negative_weight() {
        let text = "source,target,weight,type\n1,2,-0.5,semantic\n";
        let err = parse_csv(text, Path::new("x.csv")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_unknown_type() {
        let text = "source,target,weight,type\n1,2,0.5,causal\n";
        assert!(parse_csv(text, Path::new("x.csv")).is_err());
    }

    #[test]
    fn file_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/weighted_projection.csv");
        write_projection(&path, &sample()).unwrap();
        let back = read_projection(&path).unwrap();
        assert_eq!(back.len(), 2);

        let missing = read_projection(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(missing, ArtifactError::Missing(_)));
    }
}
