//! S2: name mapping. Turns a caregiver-submitted JSON mapping plus the
//! clusters S1 produced into canonical [`Person`] records, merging
//! clusters referenced by the same name and discarding unmapped ones.

use remind_config::constants::ingestion::MAX_EXEMPLARS_PER_PERSON;
use remind_core::{FaceCluster, Person};
use serde_json::Value;
use std::collections::HashMap;

/// The caregiver's submitted mapping, in whichever of the two accepted
/// shapes it was sent in.
#[derive(Debug, Clone)]
pub enum NameMapping {
    /// `name -> "cluster_id[,cluster_id...]"`, supports merging.
    Forward(HashMap<String, String>),
    /// `cluster_id -> name | null | ""`; `null`/empty means delete.
    Reverse(HashMap<u32, Option<String>>),
}

impl NameMapping {
    /// Parses `names.json`, detecting the shape by whether every key
    /// parses as an unsigned integer (reverse) or not (forward). An empty
    /// object is treated as an empty forward mapping, which deletes every
    /// cluster (the all-`null` boundary case).
    pub fn parse(raw: &Value) -> remind_core::Result<Self> {
        let object = raw.as_object().ok_or_else(|| {
            remind_core::RemindError::InputError("names.json must be a JSON object".to_string())
        })?;

        if object.is_empty() {
            return Ok(NameMapping::Forward(HashMap::new()));
        }

        let all_keys_numeric = object.keys().all(|k| k.parse::<u32>().is_ok());
        if all_keys_numeric {
            let mut reverse = HashMap::new();
            for (key, value) in object {
                let cluster_id: u32 = key.parse().map_err(|_| {
                    remind_core::RemindError::InputError(format!("invalid cluster id: {key}"))
                })?;
                let name = match value {
                    Value::Null => None,
                    Value::String(s) if s.trim().is_empty() => None,
                    Value::String(s) => Some(s.clone()),
                    other => {
                        return Err(remind_core::RemindError::InputError(format!(
                            "names.json value for {key} must be a string or null, got {other}"
                        )))
                    }
                };
                reverse.insert(cluster_id, name);
            }
            Ok(NameMapping::Reverse(reverse))
        } else {
            let mut forward = HashMap::new();
            for (key, value) in object {
                let value = value.as_str().ok_or_else(|| {
                    remind_core::RemindError::InputError(format!(
                        "names.json value for {key} must be a string"
                    ))
                })?;
                forward.insert(key.clone(), value.to_string());
            }
            Ok(NameMapping::Forward(forward))
        }
    }

    /// Normalizes either shape to `(display_name, cluster_ids)` pairs,
    /// dropping reverse entries with no name (deletions). Cluster ids
    /// within one name are kept in ascending order so merges are
    /// deterministic.
    pub fn normalize(&self) -> remind_core::Result<Vec<(String, Vec<u32>)>> {
        match self {
            NameMapping::Forward(map) => {
                let mut out = Vec::new();
                for (name, ids_csv) in map {
                    let mut ids = Vec::new();
                    for part in ids_csv.split(',') {
                        let part = part.trim();
                        if part.is_empty() {
                            continue;
                        }
                        let id: u32 = part.parse().map_err(|_| {
                            remind_core::RemindError::InputError(format!(
                                "invalid cluster id {part:?} for name {name:?}"
                            ))
                        })?;
                        ids.push(id);
                    }
                    ids.sort_unstable();
                    out.push((name.clone(), ids));
                }
                out.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(out)
            }
            NameMapping::Reverse(map) => {
                let mut by_name: HashMap<String, Vec<u32>> = HashMap::new();
                for (cluster_id, name) in map {
                    if let Some(name) = name {
                        by_name.entry(name.clone()).or_default().push(*cluster_id);
                    }
                }
                let mut out: Vec<(String, Vec<u32>)> = by_name
                    .into_iter()
                    .map(|(name, mut ids)| {
                        ids.sort_unstable();
                        (name, ids)
                    })
                    .collect();
                out.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(out)
            }
        }
    }
}

/// Applies a parsed mapping to S1's clusters, producing one [`Person`] per
/// referenced name. Clusters not referenced by any name are silently
/// dropped (the unmapped-cluster deletion rule).
pub fn apply_mapping(mapping: &NameMapping, clusters: &[FaceCluster]) -> remind_core::Result<Vec<Person>> {
    let normalized = mapping.normalize()?;
    let by_id: HashMap<u32, &FaceCluster> = clusters.iter().map(|c| (c.cluster_id, c)).collect();

    let mut people = Vec::new();
    for (display_name, cluster_ids) in normalized {
        let mut exemplars = Vec::new();
        for id in &cluster_ids {
            if let Some(cluster) = by_id.get(id) {
                exemplars.extend(cluster.sampled_faces.iter().cloned());
            }
        }
        if exemplars.is_empty() {
            continue;
        }
        exemplars.truncate(MAX_EXEMPLARS_PER_PERSON);
        people.push(Person::new(display_name, exemplars));
    }
    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cluster(id: u32, faces: &[&str]) -> FaceCluster {
        FaceCluster {
            cluster_id: id,
            encodings: vec![],
            sampled_faces: faces.iter().map(|s| s.to_string()).collect(),
            source_refs: vec![],
        }
    }

    #[test]
    fn forward_mapping_merges_clusters_by_name() {
        let raw = json!({ "steve": "0,2" });
        let mapping = NameMapping::parse(&raw).unwrap();
        let clusters = vec![cluster(0, &["a"]), cluster(1, &["b"]), cluster(2, &["c"])];
        let people = apply_mapping(&mapping, &clusters).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "steve");
        assert_eq!(people[0].face_exemplars, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn reverse_mapping_null_deletes_cluster() {
        let raw = json!({ "0": "steve", "1": null, "2": "" });
        let mapping = NameMapping::parse(&raw).unwrap();
        let clusters = vec![cluster(0, &["a"]), cluster(1, &["b"]), cluster(2, &["c"])];
        let people = apply_mapping(&mapping, &clusters).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "steve");
    }

    #[test]
    fn empty_mapping_deletes_every_cluster() {
        let raw = json!({});
        let mapping = NameMapping::parse(&raw).unwrap();
        let clusters = vec![cluster(0, &["a"])];
        let people = apply_mapping(&mapping, &clusters).unwrap();
        assert!(people.is_empty());
    }

    #[test]
    fn unreferenced_clusters_are_dropped() {
        let raw = json!({ "steve": "0" });
        let mapping = NameMapping::parse(&raw).unwrap();
        let clusters = vec![cluster(0, &["a"]), cluster(1, &["b"])];
        let people = apply_mapping(&mapping, &clusters).unwrap();
        assert_eq!(people.len(), 1);
    }

    #[test]
    fn exemplars_are_truncated_to_the_configured_maximum() {
        let raw = json!({ "steve": "0" });
        let mapping = NameMapping::parse(&raw).unwrap();
        let clusters = vec![cluster(0, &["a", "b", "c", "d", "e"])];
        let people = apply_mapping(&mapping, &clusters).unwrap();
        assert_eq!(people[0].face_exemplars.len(), MAX_EXEMPLARS_PER_PERSON);
    }
}
