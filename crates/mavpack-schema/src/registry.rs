use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::message::{FieldDescriptor, MessageDefinition};
use crate::validator::{compile, validate_document};

#[derive(Debug, Deserialize)]
struct DefinitionDocument {
    messages: Vec<RawDefinition>,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    name: String,
    id: u32,
    #[serde(default)]
    crc_extra: Option<u8>,
    fields: Vec<FieldDescriptor>,
}

/// Message definitions indexed by name and by id.
pub struct DefinitionRegistry {
    by_name: HashMap<String, Arc<MessageDefinition>>,
    by_id: HashMap<u32, Arc<MessageDefinition>>,
    config: RegistryConfig,
}

impl DefinitionRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            by_name: HashMap::new(),
            by_id: HashMap::new(),
            config,
        }
    }

    /// Register every message of a JSON definition document.
    ///
    /// Returns the number of definitions added.
    pub fn register_json(&mut self, document: &str) -> Result<usize> {
        let value: Value = serde_json::from_str(document)?;
        self.register_value(value)
    }

    /// Register every message of an already parsed definition document.
    pub fn register_value(&mut self, document: Value) -> Result<usize> {
        let validator = compile(self.config.strict_mode)?;
        validate_document(&document, &validator)?;

        let parsed: DefinitionDocument = serde_json::from_value(document)?;
        let definitions = parsed
            .messages
            .into_iter()
            .map(|raw| MessageDefinition::new(raw.name, raw.id, raw.crc_extra, raw.fields))
            .collect::<Result<Vec<_>>>()?;

        // Stage into copies of the indexes so a failed document leaves no trace.
        let mut staged = Self {
            by_name: self.by_name.clone(),
            by_id: self.by_id.clone(),
            config: self.config,
        };
        let count = definitions.len();
        for definition in definitions {
            staged.register(definition)?;
        }
        *self = staged;
        Ok(count)
    }

    /// Register a single definition.
    pub fn register(&mut self, definition: MessageDefinition) -> Result<Arc<MessageDefinition>> {
        let mut displaced: Vec<Arc<MessageDefinition>> = Vec::new();
        let name_taken = self.by_name.get(definition.name());
        let id_taken = self.by_id.get(&definition.id());
        for previous in [name_taken, id_taken].into_iter().flatten() {
            if !displaced.iter().any(|seen| Arc::ptr_eq(seen, previous)) {
                displaced.push(Arc::clone(previous));
            }
        }

        for previous in displaced {
            if !self.config.allow_redefinition {
                return Err(SchemaError::AlreadyRegistered(format!(
                    "{} (id {})",
                    previous.name(),
                    previous.id()
                )));
            }
            warn!(
                name = previous.name(),
                id = previous.id(),
                "replacing message definition"
            );
            self.by_name.remove(previous.name());
            self.by_id.remove(&previous.id());
        }

        debug!(
            name = definition.name(),
            id = definition.id(),
            payload_length = definition.payload_length(),
            "registered message definition"
        );
        let definition = Arc::new(definition);
        self.by_name
            .insert(definition.name().to_string(), Arc::clone(&definition));
        self.by_id.insert(definition.id(), Arc::clone(&definition));
        Ok(definition)
    }

    /// Load every `*.json` document in a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load every `*.json` document in a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.to_ascii_lowercase().ends_with(".json") {
                candidates.push((file_name, entry.path()));
            }
        }
        // Load order decides which definition wins under `allow_redefinition`.
        candidates.sort();

        if candidates.len() > registry.config.max_documents_from_directory {
            return Err(SchemaError::LoadFailed(format!(
                "document count exceeds configured max ({}): {}",
                registry.config.max_documents_from_directory,
                candidates.len()
            )));
        }

        for (file_name, entry_path) in candidates {
            let metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            if metadata.file_type().is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load definition symlink: {file_name}"
                )));
            }
            if !metadata.is_file() {
                continue;
            }

            let content = read_bounded(&entry_path, registry.config.max_document_file_size)?;
            let count = registry.register_json(&content).map_err(|err| match err {
                SchemaError::LoadFailed(_) => err,
                other => SchemaError::LoadFailed(format!("{file_name}: {other}")),
            })?;
            info!(file = %file_name, messages = count, "loaded definition document");
        }

        Ok(registry)
    }

    /// Load from embedded document strings.
    pub fn from_embedded(documents: &[&str]) -> Result<Self> {
        let mut registry = Self::new();
        for document in documents {
            registry.register_json(document)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<MessageDefinition>> {
        self.by_name.get(name).cloned()
    }

    pub fn get_by_id(&self, id: u32) -> Option<Arc<MessageDefinition>> {
        self.by_id.get(&id).cloned()
    }

    /// Look up by name, falling back to a numeric id.
    pub fn resolve(&self, name_or_id: &str) -> Result<Arc<MessageDefinition>> {
        if let Some(definition) = self.get(name_or_id) {
            return Ok(definition);
        }
        name_or_id
            .parse::<u32>()
            .ok()
            .and_then(|id| self.get_by_id(id))
            .ok_or_else(|| SchemaError::UnknownMessage(name_or_id.to_string()))
    }

    /// Registered message names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered definitions ordered by id.
    pub fn definitions(&self) -> Vec<Arc<MessageDefinition>> {
        let mut definitions: Vec<_> = self.by_id.values().cloned().collect();
        definitions.sort_by_key(|definition| definition.id());
        definitions
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_bounded(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening {}: {err}", path.display()))
    })?;
    let len = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?
        .len();
    if len > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "definition file too large ({len} bytes): {}",
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "definition file too large while reading: {}",
            path.display()
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const COMMON: &str = r#"{
        "messages": [
            {
                "name": "HEARTBEAT",
                "id": 0,
                "crc_extra": 50,
                "fields": [
                    { "name": "custom_mode", "type": "uint32_t" },
                    { "name": "type", "type": "uint8_t" },
                    { "name": "autopilot", "type": "uint8_t" },
                    { "name": "base_mode", "type": "uint8_t" },
                    { "name": "system_status", "type": "uint8_t" },
                    { "name": "mavlink_version", "type": "uint8_t_mavlink_version" }
                ]
            },
            {
                "name": "STATUSTEXT",
                "id": 253,
                "fields": [
                    { "name": "severity", "type": "uint8_t" },
                    { "name": "text", "type": "char[50]" },
                    { "name": "id", "type": "uint16_t", "extension": true },
                    { "name": "chunk_seq", "type": "uint8_t", "extension": true }
                ]
            }
        ]
    }"#;

    #[test]
    fn registers_embedded_documents() {
        let registry = DefinitionRegistry::from_embedded(&[COMMON]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["HEARTBEAT", "STATUSTEXT"]);

        let heartbeat = registry.get("HEARTBEAT").unwrap();
        assert_eq!(heartbeat.payload_length(), 9);
        assert_eq!(heartbeat.crc_extra(), Some(50));

        let text = registry.get_by_id(253).unwrap();
        assert_eq!(text.name(), "STATUSTEXT");
        assert_eq!(text.payload_length(), 51);
        assert_eq!(text.crc_extra(), None);
    }

    #[test]
    fn resolve_by_name_or_id() {
        let registry = DefinitionRegistry::from_embedded(&[COMMON]).unwrap();
        assert_eq!(registry.resolve("253").unwrap().name(), "STATUSTEXT");
        assert_eq!(registry.resolve("HEARTBEAT").unwrap().id(), 0);
        assert!(matches!(
            registry.resolve("NOPE"),
            Err(SchemaError::UnknownMessage(_))
        ));
    }

    #[test]
    fn definitions_sorted_by_id() {
        let registry = DefinitionRegistry::from_embedded(&[COMMON]).unwrap();
        let ids: Vec<u32> = registry.definitions().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec![0, 253]);
    }

    #[test]
    fn invalid_document_shape_fails_validation() {
        let mut registry = DefinitionRegistry::new();
        let missing_fields = r#"{"messages":[{"name":"X","id":1}]}"#;
        assert!(matches!(
            registry.register_json(missing_fields),
            Err(SchemaError::ValidationFailed(_))
        ));

        let wide_id = r#"{"messages":[{"name":"X","id":16777216,"fields":[]}]}"#;
        assert!(matches!(
            registry.register_json(wide_id),
            Err(SchemaError::ValidationFailed(_))
        ));
    }

    #[test]
    fn invalid_json_fails() {
        let mut registry = DefinitionRegistry::new();
        assert!(matches!(
            registry.register_json("not-json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn bad_type_tag_is_fatal() {
        let mut registry = DefinitionRegistry::new();
        let doc = r#"{"messages":[{"name":"X","id":1,"fields":[{"name":"a","type":"uint8_t[0]"}]}]}"#;
        assert!(matches!(
            registry.register_json(doc),
            Err(SchemaError::MalformedTypeTag { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_document_leaves_registry_unchanged() {
        let mut registry = DefinitionRegistry::new();
        let clashing_ids = r#"{"messages":[
            {"name":"A","id":1,"fields":[]},
            {"name":"B","id":1,"fields":[]}
        ]}"#;
        assert!(matches!(
            registry.register_json(clashing_ids),
            Err(SchemaError::AlreadyRegistered(_))
        ));
        assert!(registry.is_empty());

        registry.register_json(COMMON).unwrap();
        let clashes_with_existing = r#"{"messages":[
            {"name":"NEW","id":7,"fields":[]},
            {"name":"HEARTBEAT","id":8,"fields":[]}
        ]}"#;
        assert!(registry.register_json(clashes_with_existing).is_err());
        assert_eq!(registry.names(), vec!["HEARTBEAT", "STATUSTEXT"]);
        assert!(registry.get_by_id(7).is_none());
        assert_eq!(registry.get("HEARTBEAT").unwrap().id(), 0);
    }

    #[test]
    fn strict_mode_rejects_unknown_keys() {
        let doc = r#"{"messages":[{"name":"X","id":1,"fields":[],"units":"m"}]}"#;

        let mut permissive = DefinitionRegistry::new();
        assert_eq!(permissive.register_json(doc).unwrap(), 1);

        let mut strict = DefinitionRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        assert!(matches!(
            strict.register_json(doc),
            Err(SchemaError::ValidationFailed(_))
        ));
    }

    #[test]
    fn duplicate_definitions_rejected_by_default() {
        let mut registry = DefinitionRegistry::from_embedded(&[COMMON]).unwrap();
        let same_id = MessageDefinition::new("OTHER", 0, None, vec![]).unwrap();
        assert!(matches!(
            registry.register(same_id),
            Err(SchemaError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn redefinition_replaces_both_indexes() {
        let mut registry = DefinitionRegistry::with_config(RegistryConfig {
            allow_redefinition: true,
            ..RegistryConfig::default()
        });
        registry.register_json(COMMON).unwrap();

        let replacement = MessageDefinition::new("PING", 0, None, vec![]).unwrap();
        registry.register(replacement).unwrap();

        assert!(registry.get("HEARTBEAT").is_none());
        assert_eq!(registry.get_by_id(0).unwrap().name(), "PING");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn from_directory_loads_json_files() {
        let dir = make_temp_dir("from-directory");
        write_file(&dir, "common.json", COMMON);
        write_file(
            &dir,
            "extra.json",
            r#"{"messages":[{"name":"PING","id":4,"fields":[{"name":"seq","type":"uint32_t"}]}]}"#,
        );
        write_file(&dir, "notes.txt", "ignored");

        let registry = DefinitionRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.names(), vec!["HEARTBEAT", "PING", "STATUSTEXT"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_enforces_limits() {
        let dir = make_temp_dir("limits");
        write_file(&dir, "a.json", COMMON);
        write_file(&dir, "b.json", r#"{"messages":[]}"#);

        let count_limited = DefinitionRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_documents_from_directory: 1,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(count_limited, Err(SchemaError::LoadFailed(_))));

        let size_limited = DefinitionRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_document_file_size: 32,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(size_limited, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_reports_file_name() {
        let dir = make_temp_dir("bad-file");
        write_file(&dir, "broken.json", "{");

        let err = DefinitionRegistry::from_directory(&dir).err().unwrap();
        assert!(err.to_string().contains("broken.json"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn from_directory_refuses_symlinks() {
        let dir = make_temp_dir("symlink");
        let target = dir.join("real.txt");
        std::fs::write(&target, COMMON).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("linked.json")).unwrap();

        assert!(matches!(
            DefinitionRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mavpack-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
