// Configuration types for seqbind-codegen, deserialized from seqbind.config.toml.

use std::collections::HashSet;

use serde::Deserialize;

/// Top-level config file.
#[derive(Debug, Deserialize)]
pub struct SeqbindConfig {
    pub codegen: CodegenConfig,
}

#[derive(Debug, Deserialize)]
pub struct CodegenConfig {
    /// Declaration model, relative to the config file.
    pub package: String,
    #[serde(default = "default_native_path")]
    pub native_path: String,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    pub paths: CodegenPaths,
    #[serde(default)]
    pub blocklist: Blocklist,
}

impl CodegenConfig {
    pub fn options(&self) -> CodegenOptions {
        CodegenOptions {
            native_path: self.native_path.clone(),
            name_prefix: self.name_prefix.clone(),
            blocklist: self.blocklist.clone(),
        }
    }
}

fn default_native_path() -> String {
    "crate::native".to_string()
}

fn default_name_prefix() -> String {
    "Seq".to_string()
}

/// Output locations, relative to the config file.
#[derive(Debug, Deserialize)]
pub struct CodegenPaths {
    pub caller_out: String,
    pub callee_out: String,
    /// Optional call table manifest.
    #[serde(default)]
    pub codes_out: Option<String>,
}

/// Members that keep their codes but get no stubs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Blocklist {
    /// Free function names.
    #[serde(default)]
    pub functions: Vec<String>,
    /// Struct members in "Type.Member" format.
    #[serde(default)]
    pub members: Vec<String>,
}

impl Blocklist {
    /// Parse member blocklist entries into (type, member) tuples. Entries
    /// not of the form "Type.Member" block nothing and are logged.
    pub fn member_tuples(&self) -> Vec<(String, String)> {
        self.members
            .iter()
            .filter_map(|entry| match entry.split_once('.') {
                Some((ty, member)) if !ty.is_empty() && !member.is_empty() => {
                    Some((ty.to_string(), member.to_string()))
                }
                _ => {
                    tracing::warn!(%entry, "ignoring blocklist member, expected \"Type.Member\"");
                    None
                }
            })
            .collect()
    }
}

/// Everything `generate` needs besides the model.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Rust path of the native package the callee half calls into.
    pub native_path: String,
    /// Prefix of caller wrapper type names.
    pub name_prefix: String,
    pub blocklist: Blocklist,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            native_path: default_native_path(),
            name_prefix: default_name_prefix(),
            blocklist: Blocklist::default(),
        }
    }
}

/// Resolved blocklist lookups.
#[derive(Debug, Default)]
pub struct BlockSet {
    functions: HashSet<String>,
    members: HashSet<(String, String)>,
}

impl BlockSet {
    pub fn new(blocklist: &Blocklist) -> Self {
        BlockSet {
            functions: blocklist.functions.iter().cloned().collect(),
            members: blocklist.member_tuples().into_iter().collect(),
        }
    }

    pub fn blocks_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn blocks_member(&self, owner: &str, member: &str) -> bool {
        self.members.contains(&(owner.to_string(), member.to_string()))
    }
}
