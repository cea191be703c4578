use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_yaml::Value as YamlValue;
use tera::{Context, Function, Tera, Value as TeraValue};

use crate::error::{Error, ErrorKind, Result};
use crate::functions::register_sprig_library;
use crate::refs::missing_root_reference;

pub type IncludeLibrary = Arc<BTreeMap<String, String>>;

/// Build the include library from the regular files in `include/` (§4.2
/// "Include library construction"): basename stripped at the first `.`,
/// collision is an error.
pub fn build_include_library<'a, I>(files: I) -> Result<IncludeLibrary>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut lib = BTreeMap::new();
    for (filename, contents) in files {
        let name = filename.split('.').next().unwrap_or(filename).to_string();
        if lib.insert(name.clone(), contents.to_string()).is_some() {
            return Err(ErrorKind::IncludeCollision(name).into());
        }
    }
    Ok(Arc::new(lib))
}

struct IncludeFn {
    library: IncludeLibrary,
}

impl Function for IncludeFn {
    fn call(&self, args: &HashMap<String, TeraValue>) -> tera::Result<TeraValue> {
        let name = args
            .get("name")
            .and_then(TeraValue::as_str)
            .ok_or_else(|| tera::Error::msg("include() requires a `name` argument"))?;
        let body = self
            .library
            .get(name)
            .ok_or_else(|| tera::Error::msg(format!("include: no such template '{}'", name)))?;
        let ctx_value = args
            .get("ctx")
            .cloned()
            .unwrap_or_else(|| TeraValue::Object(Default::default()));
        let ctx = Context::from_value(ctx_value)?;
        render_raw(body, &ctx, &self.library).map(TeraValue::String)
    }

    fn is_safe(&self) -> bool {
        false
    }
}

/// Render `body` against `ctx` in a fresh `Tera` instance carrying the same
/// helper library and the same frozen include registry — recursive
/// `include` calls re-parse their target per call rather than relying on
/// mutable template-set state (design note, §9).
fn render_raw(body: &str, ctx: &Context, library: &IncludeLibrary) -> tera::Result<String> {
    let mut tera = Tera::default();
    register_sprig_library(&mut tera);
    tera.register_function("include", IncludeFn { library: library.clone() });
    tera.add_raw_template("__body__", body)?;
    tera.render("__body__", ctx)
}

/// Renders templates against a decoded values object, with the include
/// library frozen for the lifetime of the renderer (§4.2, §9).
pub struct Renderer {
    library: IncludeLibrary,
}

impl Renderer {
    pub fn new(library: IncludeLibrary) -> Renderer {
        Renderer { library }
    }

    /// Build the context templates see: every top-level key of `values` is
    /// inserted directly (so `{{ universalValue }}` works unprefixed), and
    /// the whole object is also bound under `values` so includes can be
    /// handed an explicit `ctx=values`, matching §4.2's `include(name,
    /// ctx)` signature.
    pub fn context(values: &YamlValue) -> Result<Context> {
        let json = yaml_to_json(values)?;
        let mut ctx = Context::from_value(json.clone())
            .map_err(|e| Error::from(ErrorKind::RenderFailed("context".into(), e.to_string())))?;
        ctx.insert("values", &json);
        Ok(ctx)
    }

    /// Render `template` against `ctx`. Checks every top-level identifier
    /// the template references against `ctx` first and raises the exact
    /// §4.2/§8 "undefined key" message for the first one missing — tera
    /// itself errors on undefined variables too, but we don't rely on its
    /// wording so the message stays byte-stable across tera releases.
    pub fn render(&self, name: &str, template: &str, ctx: &Context) -> Result<String> {
        if let Some(root) = missing_root_reference(template, ctx) {
            return Err(ErrorKind::RenderFailed(
                name.to_string(),
                format!("map has no entry for key \"{}\"", root),
            )
            .into());
        }
        render_raw(template, ctx, &self.library)
            .map(|s| trim_trailing_whitespace(&s))
            .map_err(|e| Error::from(ErrorKind::RenderFailed(name.to_string(), describe_tera_error(&e))))
    }
}

/// Trim trailing whitespace from every line, mirroring the teacher's
/// `render()` convenience pass (mostly to keep linters happy downstream).
fn trim_trailing_whitespace(s: &str) -> String {
    s.lines().map(|l| l.trim_end()).collect::<Vec<_>>().join("\n")
}

fn yaml_to_json(v: &YamlValue) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(v)?)
}

fn describe_tera_error(e: &tera::Error) -> String {
    let mut chain = vec![e.to_string()];
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        chain.push(s.to_string());
        source = s.source();
    }
    chain.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value as YamlValue;

    #[test]
    fn simple_value_override() {
        let values: YamlValue = serde_yaml::from_str("universalValue: 42\nprovider:\n  region: us-east-1\n").unwrap();
        let ctx = Renderer::context(&values).unwrap();
        let lib = build_include_library(Vec::<(&str, &str)>::new()).unwrap();
        let r = Renderer::new(lib);
        let out = r
            .render("values", "answer: {{ universalValue }}\nregion: {{ provider.region }}", &ctx)
            .unwrap();
        assert_eq!(out, "answer: 42\nregion: us-east-1");
    }

    #[test]
    fn include_composition_with_nindent() {
        let values: YamlValue = serde_yaml::from_str("{}").unwrap();
        let ctx = Renderer::context(&values).unwrap();
        let lib = build_include_library(vec![("instances.yaml", "- small\n- medium\n- large")]).unwrap();
        let r = Renderer::new(lib);
        let tmpl = "availableInstances:{{ include(name=\"instances\", ctx=values) | nindent(spaces=2) }}";
        let out = r.render("values", tmpl, &ctx).unwrap();
        assert_eq!(out, "availableInstances:\n  - small\n  - medium\n  - large");
    }

    #[test]
    fn undefined_key_is_a_hard_error() {
        let values: YamlValue = serde_yaml::from_str("{}").unwrap();
        let ctx = Renderer::context(&values).unwrap();
        let lib = build_include_library(Vec::<(&str, &str)>::new()).unwrap();
        let r = Renderer::new(lib);
        let err = r.render("values", "{{ this.key.is.missing }}", &ctx).unwrap_err();
        assert!(err.to_string().contains("map has no entry for key \"this\""));
    }

    #[test]
    fn include_collision_is_rejected() {
        let err = build_include_library(vec![("instances.yaml", "a"), ("instances.yml", "b")]).unwrap_err();
        assert!(err.to_string().contains("instances"));
    }
}
