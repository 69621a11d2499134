//! Toolchain binary resolution.
//!
//! When a cross-compilation prefix (`HOST`) is configured, the canonical
//! compiler, assembler and archiver names are first looked up as
//! `<host>-<name>` (the usual `<target-triple>-<tool>` convention). Every
//! acceptable alias is tried under the prefix before falling back to the
//! native names, so a cross toolchain that ships only some aliases is still
//! found.
//!
//! Resolution priority:
//! 1. `<host>-<name>` for each name in the request (toolchain binaries only)
//! 2. `<name>` for each name in the request
//!
//! Failing to find a tool is not an error at this layer. A [`Resolution`]
//! carries either the tool or [`ResolvedTool::NotFound`], plus any advisories
//! produced on the way (such as a cross tool being absent).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::builder::errors::ExtError;
use crate::core::env::BuildEnv;
use crate::core::tool_request::ToolRequest;

mod search;

pub use search::{PathSearch, WhichSearch};

/// Tool names that are looked up under the cross prefix.
pub const CROSS_TOOLS: &[&str] = &["cc", "gcc", "g++", "as", "gas", "ranlib", "ar"];

/// Whether a tool name is a toolchain binary that honours the cross prefix.
pub fn is_cross_capable(name: &str) -> bool {
    CROSS_TOOLS.contains(&name)
}

/// Outcome of resolving a [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTool {
    /// The concrete binary name chosen and where it lives.
    Found { name: String, path: PathBuf },
    /// Nothing in the request exists, prefixed or not.
    NotFound,
}

impl ResolvedTool {
    /// The chosen binary name, if found.
    pub fn name(&self) -> Option<&str> {
        match self {
            ResolvedTool::Found { name, .. } => Some(name),
            ResolvedTool::NotFound => None,
        }
    }

    /// The chosen binary path, if found.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedTool::Found { path, .. } => Some(path),
            ResolvedTool::NotFound => None,
        }
    }
}

/// Non-fatal message produced while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// No `<host>-<tool>` binary exists; native names are tried next.
    CrossToolMissing { host: String, primary: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::CrossToolMissing { host, primary } => {
                write!(f, "did not find {}-{}, falling back", host, primary)
            }
        }
    }
}

/// A resolved tool together with the advisories raised while resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tool: ResolvedTool,
    pub advisories: Vec<Advisory>,
}

impl Resolution {
    /// Log every advisory as a warning.
    pub fn log_advisories(&self) {
        for advisory in &self.advisories {
            tracing::warn!("{}", advisory);
        }
    }

    /// Require a found tool, turning `NotFound` into [`ExtError::ToolNotFound`].
    pub fn require(self, request: &ToolRequest) -> Result<(String, PathBuf), ExtError> {
        match self.tool {
            ResolvedTool::Found { name, path } => Ok((name, path)),
            ResolvedTool::NotFound => Err(ExtError::ToolNotFound {
                request: request.names().to_vec(),
            }),
        }
    }
}

/// Prefixed names to probe for a request, or `None` when prefixing does not apply.
///
/// Prefixing applies only with a configured host and only when the primary
/// name is a toolchain binary.
pub fn cross_candidates(request: &ToolRequest, env: &BuildEnv) -> Option<Vec<String>> {
    let host = env.host()?;
    if !is_cross_capable(request.primary()) {
        return None;
    }

    Some(
        request
            .names()
            .iter()
            .map(|name| format!("{}-{}", host, name))
            .collect(),
    )
}

/// Resolve a tool request: cross names first, then the native names.
pub fn resolve(request: &ToolRequest, env: &BuildEnv, search: &dyn PathSearch) -> Resolution {
    let mut advisories = Vec::new();

    if let Some(candidates) = cross_candidates(request, env) {
        for candidate in candidates {
            if let Some(path) = search.which(&candidate) {
                tracing::debug!("resolved `{}` to cross tool {}", request, path.display());
                return Resolution {
                    tool: ResolvedTool::Found {
                        name: candidate,
                        path,
                    },
                    advisories,
                };
            }
        }

        advisories.push(Advisory::CrossToolMissing {
            host: env.host().unwrap_or_default().to_string(),
            primary: request.primary().to_string(),
        });
    }

    Resolution {
        tool: resolve_native(request, search),
        advisories,
    }
}

/// The first name in the request that exists on the search path.
fn resolve_native(request: &ToolRequest, search: &dyn PathSearch) -> ResolvedTool {
    request
        .names()
        .iter()
        .find_map(|name| {
            search.which(name).map(|path| ResolvedTool::Found {
                name: name.clone(),
                path,
            })
        })
        .unwrap_or(ResolvedTool::NotFound)
}

/// Resolver bound to one environment, memoizing results per request.
///
/// Resolution is a pure function of the request and the environment, so
/// repeated lookups of the same request return the first answer.
pub struct Resolver<'a> {
    env: &'a BuildEnv,
    search: &'a dyn PathSearch,
    cache: Mutex<HashMap<ToolRequest, Resolution>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    pub fn new(env: &'a BuildEnv, search: &'a dyn PathSearch) -> Self {
        Resolver {
            env,
            search,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a request, logging advisories the first time it is seen.
    pub fn resolve(&self, request: &ToolRequest) -> Resolution {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(hit) = cache.get(request) {
            return hit.clone();
        }

        let resolution = resolve(request, self.env, self.search);
        resolution.log_advisories();
        cache.insert(request.clone(), resolution.clone());
        resolution
    }

    /// Resolve a request and require a result.
    pub fn require(&self, request: &ToolRequest) -> Result<(String, PathBuf), ExtError> {
        self.resolve(request).require(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubSearch;

    fn cross_env(host: &str) -> BuildEnv {
        BuildEnv::builder().host(Some(host)).build()
    }

    #[test]
    fn test_cross_tool_preferred() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new().with("arm-linux-gcc").with("gcc");

        let res = resolve(&ToolRequest::single("gcc"), &env, &search);
        assert_eq!(res.tool.name(), Some("arm-linux-gcc"));
        assert!(res.advisories.is_empty());
    }

    #[test]
    fn test_falls_back_to_native_with_advisory() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new().with("gcc");

        let res = resolve(&ToolRequest::single("gcc"), &env, &search);
        assert_eq!(res.tool.name(), Some("gcc"));
        assert_eq!(
            res.advisories,
            vec![Advisory::CrossToolMissing {
                host: "arm-linux".to_string(),
                primary: "gcc".to_string(),
            }]
        );
        assert_eq!(
            res.advisories[0].to_string(),
            "did not find arm-linux-gcc, falling back"
        );
        assert_eq!(search.queries(), vec!["arm-linux-gcc", "gcc"]);
    }

    #[test]
    fn test_all_aliases_tried_under_prefix_first() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new().with("arm-linux-cc").with("gcc");

        let request = ToolRequest::new(["gcc", "cc"]).unwrap();
        let res = resolve(&request, &env, &search);
        assert_eq!(res.tool.name(), Some("arm-linux-cc"));
        assert_eq!(search.queries(), vec!["arm-linux-gcc", "arm-linux-cc"]);
    }

    #[test]
    fn test_non_toolchain_tool_skips_prefix() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new().with("arm-linux-python").with("python");

        let res = resolve(&ToolRequest::single("python"), &env, &search);
        assert_eq!(res.tool.name(), Some("python"));
        assert!(res.advisories.is_empty());
        assert_eq!(search.queries(), vec!["python"]);
    }

    #[test]
    fn test_native_build_never_prefixes() {
        let env = BuildEnv::default();
        let search = StubSearch::new().with("ar");

        let res = resolve(&ToolRequest::single("ar"), &env, &search);
        assert_eq!(res.tool.name(), Some("ar"));
        assert_eq!(search.queries(), vec!["ar"]);
    }

    #[test]
    fn test_not_found_is_a_result() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new();

        let request = ToolRequest::new(["gcc", "cc"]).unwrap();
        let res = resolve(&request, &env, &search);
        assert_eq!(res.tool, ResolvedTool::NotFound);
        assert_eq!(res.advisories.len(), 1);

        let err = res.require(&request).unwrap_err();
        assert!(matches!(err, ExtError::ToolNotFound { .. }));
    }

    #[test]
    fn test_cross_candidates_pure() {
        let env = cross_env("mips-elf");
        let request = ToolRequest::new(["as", "gas"]).unwrap();
        assert_eq!(
            cross_candidates(&request, &env),
            Some(vec!["mips-elf-as".to_string(), "mips-elf-gas".to_string()])
        );

        // Only the primary name decides whether prefixing applies
        let request = ToolRequest::new(["nasm", "as"]).unwrap();
        assert_eq!(cross_candidates(&request, &env), None);

        assert_eq!(
            cross_candidates(&ToolRequest::single("gcc"), &BuildEnv::default()),
            None
        );
    }

    #[test]
    fn test_resolver_memoizes() {
        let env = cross_env("arm-linux");
        let search = StubSearch::new().with("arm-linux-ar");
        let resolver = Resolver::new(&env, &search);

        let request = ToolRequest::single("ar");
        let first = resolver.resolve(&request);
        let second = resolver.resolve(&request);
        assert_eq!(first, second);
        assert_eq!(search.queries().len(), 1);
    }
}
