use std::collections::BTreeMap;

/// Credential lookup over a parsed dotenv map with a process-environment
/// fallback. Adapters never read the environment directly; everything goes
/// through a [`Config`] resolved up front.
#[derive(Clone, Default)]
pub struct Env {
    pub dotenv: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.dotenv.keys().map(|key| key.as_str()).collect();
        f.debug_struct("Env").field("dotenv_keys", &keys).finish()
    }
}

impl Env {
    pub fn parse_dotenv(contents: &str) -> Self {
        Self {
            dotenv: parse_dotenv(contents),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.dotenv.get(key) {
            return Some(value.clone());
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::<String, String>::new();

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            continue;
        };
        let key = raw_key.trim();
        if key.is_empty() {
            continue;
        }

        let mut value = raw_value.trim().to_string();
        if let Some(stripped) = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        {
            value = stripped.to_string();
        }

        if value.trim().is_empty() {
            continue;
        }

        out.insert(key.to_string(), value);
    }

    out
}

const STABILITY_KEYS: &[&str] = &["STABILITY_API_KEY"];
const REPLICATE_KEYS: &[&str] = &["REPLICATE_API_TOKEN", "REPLICATE_API_KEY"];
const HUGGING_FACE_KEYS: &[&str] = &["HUGGINGFACE_API_KEY", "HF_API_TOKEN"];

/// Per-provider credentials, resolved once and handed to the generator.
/// Absence of every credential is not an error; generation degrades to the
/// free-tier/placeholder path.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub stability_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub hugging_face_api_token: Option<String>,
}

impl Config {
    pub fn from_env(env: &Env) -> Self {
        Self {
            stability_api_key: first_nonempty(env, STABILITY_KEYS),
            replicate_api_token: first_nonempty(env, REPLICATE_KEYS),
            hugging_face_api_token: first_nonempty(env, HUGGING_FACE_KEYS),
        }
    }
}

fn first_nonempty(env: &Env, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| env.get(key))
        .filter(|value| !value.trim().is_empty())
}
