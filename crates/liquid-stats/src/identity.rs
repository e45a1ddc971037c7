use std::path::PathBuf;

use directories::ProjectDirs;

/// Identifies one engine instance's persisted-statistics file.
///
/// This replaces the original's trick of deriving a config path from the
/// defining Python module's `__file__`: the owning operation supplies its
/// logical module path and class name explicitly (typically `module_path!()`
/// and `stringify!(Self)`), so the mapping from operation to config file
/// does not depend on where the crate happens to be built from.
#[derive(Clone, Copy, Debug)]
pub struct EngineIdentity {
    pub module_path: &'static str,
    pub class_name: &'static str,
}

impl EngineIdentity {
    pub const fn new(module_path: &'static str, class_name: &'static str) -> Self {
        Self {
            module_path,
            class_name,
        }
    }

    /// Resolve the on-disk path for this identity's statistics file, rooted
    /// at `base_dir` if given, or a user-scoped config directory otherwise.
    ///
    /// e.g. `~/.config/liquid-engine/liquid/liquid_ops_demo::IntensityScaleOp/IntensityScaleOp.json`
    pub fn config_path(&self, base_dir: Option<&std::path::Path>) -> PathBuf {
        let root = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_config_root(),
        };
        root.join("liquid")
            .join(sanitize(self.module_path))
            .join(format!("{}.json", self.class_name))
    }
}

fn default_config_root() -> PathBuf {
    ProjectDirs::from("", "", "liquid-engine")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".liquid-engine"))
}

/// Module paths contain `::`, which is not a valid path separator on every
/// platform; flatten it to a filesystem-safe token.
fn sanitize(module_path: &str) -> String {
    module_path.replace("::", "__")
}
