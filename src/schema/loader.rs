//! Schema loader for JSON schema descriptions
//!
//! JSON has no tagged declarations, so field shapes are classified the
//! untyped way:
//! - string: a type tag (`"string"`, `"Number"`, `"/^\\d+$/i"` for a pattern)
//! - `true`: the always-accept marker
//! - array: array of the first element's declaration
//! - object whose keys are all field options: an explicit spec
//! - any other object: a nested sub-schema
//!
//! `schema` counts as an option key only next to `type`, so canonical output
//! from [`Schema::to_json`] loads back unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value as Json};

use crate::observability::Event;

use super::catalog::map_shorthand;
use super::decl::{FieldDecl, SchemaDecl, SpecDecl};
use super::errors::{SchemaError, SchemaResult};
use super::normalizer::normalize;
use super::types::{FieldType, Schema};
use super::value::{Pattern, Value};

/// Keys that mark an object as a field spec rather than a sub-schema.
pub const FIELD_OPTION_KEYS: &[&str] = &[
    "type",
    "index",
    "unique",
    "sparse",
    "default",
    "get",
    "set",
    "enumerable",
    "dynamic",
];

/// Returns true when every key of `map` is a field option.
///
/// An empty object counts as a spec (with no type).
pub fn is_field_spec(map: &Map<String, Json>) -> bool {
    let has_type = map.contains_key("type");
    map.keys()
        .all(|key| FIELD_OPTION_KEYS.contains(&key.as_str()) || (key == "schema" && has_type))
}

/// Parses a JSON schema description into a declaration.
pub fn parse_description(json: &Json) -> SchemaResult<SchemaDecl> {
    match json {
        Json::Object(map) => parse_schema("", map),
        other => Err(SchemaError::NotAnObject(json_type_name(other))),
    }
}

/// Parses and normalizes a JSON schema description.
pub fn load_str(text: &str) -> SchemaResult<Schema> {
    let json: Json = serde_json::from_str(text)?;
    Ok(normalize(parse_description(&json)?))
}

/// Reads, parses and normalizes a schema file.
pub fn load_file(path: &Path) -> SchemaResult<Schema> {
    let content = fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let schema = load_str(&content)?;
    tracing::info!(
        event = Event::SchemaLoaded.as_str(),
        path = %path.display(),
        fields = schema.len()
    );
    Ok(schema)
}

/// Registry of named, normalized schemas backed by a directory of JSON files.
///
/// Registered schemas are immutable; a name can be registered once.
pub struct SchemaLoader {
    /// Directory containing `<name>.json` files
    schema_dir: PathBuf,
    /// Loaded schemas indexed by name
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaLoader {
    /// Creates a loader for the given directory.
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            schemas: BTreeMap::new(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every `*.json` file in the schema directory.
    ///
    /// A missing directory is treated as empty.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.schema_dir.exists() {
            return Ok(());
        }

        let unreadable = |e: std::io::Error| SchemaError::Unreadable {
            path: self.schema_dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.schema_dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            // Skip non-JSON files
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let schema = load_file(&path)?;
            self.register(name, schema)?;
        }

        Ok(())
    }

    /// Registers a schema under `name`.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> SchemaResult<Arc<Schema>> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::AlreadyRegistered(name));
        }
        let schema = Arc::new(schema);
        self.schemas.insert(name, Arc::clone(&schema));
        Ok(schema)
    }

    /// Gets a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Writes a schema's canonical JSON to `<schema_dir>/<name>.json`.
    pub fn save_schema(&self, name: &str, schema: &Schema) -> SchemaResult<PathBuf> {
        let path = self.schema_dir.join(format!("{}.json", name));
        if path.exists() {
            return Err(SchemaError::AlreadyRegistered(name.to_string()));
        }

        let io_error = |e: std::io::Error| SchemaError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        fs::create_dir_all(&self.schema_dir).map_err(io_error)?;
        let content = serde_json::to_string_pretty(&schema.to_json())?;
        fs::write(&path, content).map_err(io_error)?;

        Ok(path)
    }
}

fn parse_schema(prefix: &str, map: &Map<String, Json>) -> SchemaResult<SchemaDecl> {
    let mut decl = SchemaDecl::new();
    for (name, field) in map {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        decl = decl.field(name.clone(), parse_field(&path, field)?);
    }
    Ok(decl)
}

fn parse_field(path: &str, json: &Json) -> SchemaResult<FieldDecl> {
    match json {
        Json::String(tag) => Ok(FieldDecl::Shorthand(parse_type_tag(path, tag)?)),
        Json::Bool(true) => Ok(FieldDecl::Shorthand(FieldType::Any)),
        Json::Array(items) => match items.first() {
            Some(element) => Ok(FieldDecl::array_of(parse_field(path, element)?)),
            None => Ok(FieldDecl::untyped_array()),
        },
        Json::Object(map) if is_field_spec(map) => Ok(FieldDecl::Explicit(parse_spec(path, map)?)),
        Json::Object(map) => Ok(FieldDecl::SubSchema(parse_schema(path, map)?)),
        other => Err(SchemaError::UnsupportedDeclaration {
            field: path.to_string(),
            found: other.to_string(),
        }),
    }
}

fn parse_spec(path: &str, map: &Map<String, Json>) -> SchemaResult<SpecDecl> {
    if map.contains_key("get") || map.contains_key("set") {
        return Err(SchemaError::AccessorInJson(path.to_string()));
    }

    let mut spec = match map.get("type") {
        None => SpecDecl::untyped(),
        Some(Json::String(tag)) => SpecDecl::new(parse_type_tag(path, tag)?),
        Some(Json::Bool(true)) => SpecDecl::new(FieldType::Any),
        Some(other) => {
            return Err(SchemaError::UnsupportedDeclaration {
                field: path.to_string(),
                found: other.to_string(),
            })
        }
    };

    if let Some(nested) = map.get("schema") {
        spec = match nested {
            Json::Object(fields) if spec.field_type == Some(FieldType::Object) => {
                spec.schema(parse_schema(path, fields)?)
            }
            element => spec.schema(parse_field(path, element)?),
        };
    }
    if let Some(default) = map.get("default") {
        spec = spec.default_value(Value::from(default.clone()));
    }
    if let Some(enumerable) = map.get("enumerable") {
        spec = spec.enumerable(flag(enumerable));
    }

    Ok(spec
        .dynamic(map.get("dynamic").map_or(false, flag))
        .index(map.get("index").map_or(false, flag))
        .unique(map.get("unique").map_or(false, flag))
        .sparse(map.get("sparse").map_or(false, flag)))
}

/// Parses a type tag. `/source/flags` becomes a pattern.
fn parse_type_tag(path: &str, tag: &str) -> SchemaResult<FieldType> {
    let Some((source, flags)) = split_pattern_literal(tag) else {
        return Ok(map_shorthand(tag));
    };

    let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's' | 'x')).collect();
    let full = if inline.is_empty() {
        source.to_string()
    } else {
        format!("(?{}){}", inline, source)
    };

    Pattern::new(&full)
        .map(FieldType::Pattern)
        .map_err(|e| SchemaError::InvalidPattern {
            field: path.to_string(),
            source_text: tag.to_string(),
            reason: e.to_string(),
        })
}

fn split_pattern_literal(tag: &str) -> Option<(&str, &str)> {
    let rest = tag.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    Some((&rest[..end], &rest[end + 1..]))
}

fn flag(json: &Json) -> bool {
    Value::from(json.clone()).is_truthy()
}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
