//! Serialization of a project to the `project.pbxproj` text format.
//!
//! The format is the old-style property list Xcode uses: every object is
//! printed once in the `objects` dictionary, grouped by class, and objects
//! refer to each other by identifier.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::util::paths;
use crate::xcode::file_type;
use crate::xcode::object::{
    AttributeValue, CompilerFlags, Object, ObjectArena, ObjectClass, ObjectId, PbxAttributes,
};
use crate::xcode::project::PbxProject;

/// Upgrade check version written in the project attributes.
const LAST_UPGRADE_CHECK: &str = "1430";

/// Interpreter running the generated build scripts.
const SHELL_PATH: &str = "/usr/bin/python3";

/// Layout of one printed object.
#[derive(Debug, Clone, Copy)]
struct Rules {
    one_line: bool,
    level: usize,
}

impl Rules {
    fn for_class(class: ObjectClass, indent: usize) -> Self {
        match class {
            ObjectClass::BuildFile | ObjectClass::FileReference => Rules {
                one_line: true,
                level: 0,
            },
            _ => Rules {
                one_line: false,
                level: indent + 1,
            },
        }
    }
}

/// A value in the property list.
enum Value<'a> {
    Str(&'a str),
    Ref(ObjectId),
    List(Vec<ObjectId>),
    Map(&'a PbxAttributes),
    /// Printed verbatim, without quoting.
    Raw(String),
}

struct Printer<'a> {
    arena: &'a ObjectArena,
    out: String,
}

impl<'a> Printer<'a> {
    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push('\t');
        }
    }

    fn separator(&mut self, rules: Rules) {
        if rules.one_line {
            self.out.push(' ');
        } else {
            self.out.push('\n');
        }
    }

    fn value(&mut self, rules: Rules, value: &Value<'_>) {
        match value {
            Value::Str(s) => write_string(&mut self.out, s),
            Value::Raw(s) => self.out.push_str(s),
            Value::Ref(obj) => self.out.push_str(&self.arena.reference(*obj)),
            Value::List(items) => {
                self.out.push('(');
                self.separator(rules);
                for &item in items {
                    if !rules.one_line {
                        self.indent(rules.level + 1);
                    }
                    self.out.push_str(&self.arena.reference(item));
                    self.out.push(',');
                    self.separator(rules);
                }
                if !rules.one_line {
                    self.indent(rules.level);
                }
                self.out.push(')');
            }
            Value::Map(map) => self.map(rules, map),
        }
    }

    fn map(&mut self, rules: Rules, map: &BTreeMap<String, AttributeValue>) {
        self.out.push('{');
        self.separator(rules);
        let inner = Rules {
            one_line: rules.one_line,
            level: rules.level + 1,
        };
        for (key, value) in map {
            match value {
                AttributeValue::String(s) => self.property(inner, key, &Value::Str(s)),
                AttributeValue::Map(m) => self.property(inner, key, &Value::Map(m)),
            }
        }
        if !rules.one_line {
            self.indent(rules.level);
        }
        self.out.push('}');
    }

    fn property(&mut self, rules: Rules, name: &str, value: &Value<'_>) {
        if !rules.one_line {
            self.indent(rules.level);
        }
        self.out.push_str(name);
        self.out.push_str(" = ");
        self.value(rules, value);
        self.out.push(';');
        self.separator(rules);
    }

    fn object(&mut self, obj: ObjectId, indent: usize) {
        let rules = Rules::for_class(self.arena.class(obj), indent);

        self.indent(indent);
        self.out.push_str(&self.arena.reference(obj));
        self.out.push_str(" = {");
        if !rules.one_line {
            self.out.push('\n');
        }

        for (name, value) in self.properties(obj) {
            self.property(rules, name, &value);
        }

        if !rules.one_line {
            self.indent(indent);
        }
        self.out.push_str("};\n");
    }

    /// Properties of `obj` in printing order, starting with `isa`.
    fn properties(&self, obj: ObjectId) -> Vec<(&'static str, Value<'a>)> {
        let arena = self.arena;
        let isa = Value::Raw(arena.class(obj).as_str().to_string());
        let mut props = vec![("isa", isa)];

        match arena.get(obj) {
            Object::AggregateTarget(data) => {
                props.push(("buildConfigurationList", Value::Ref(data.configurations)));
                props.push(("buildPhases", Value::List(data.build_phases.clone())));
                props.push(("dependencies", Value::List(data.dependencies.clone())));
                props.push(("name", Value::Str(&data.name)));
                props.push(("productName", Value::Str(&data.name)));
            }
            Object::BuildFile {
                file_ref,
                compiler_flags,
                ..
            } => {
                props.push(("fileRef", Value::Ref(*file_ref)));
                if *compiler_flags == CompilerFlags::Help {
                    props.push((
                        "settings",
                        Value::Raw("{COMPILER_FLAGS = \"--help\"; }".to_string()),
                    ));
                }
            }
            Object::ContainerItemProxy { project, target } => {
                props.push(("containerPortal", Value::Ref(*project)));
                props.push(("proxyType", Value::Raw("1".to_string())));
                props.push((
                    "remoteGlobalIDString",
                    Value::Raw(arena.id(*target).unwrap_or_default().to_string()),
                ));
                let remote_info = arena.target_name(*target).unwrap_or_default();
                props.push(("remoteInfo", Value::Str(remote_info)));
            }
            Object::FileReference {
                name,
                path,
                file_type,
            } => {
                if !file_type.is_empty() {
                    props.push(("explicitFileType", Value::Str(file_type)));
                    props.push(("includeInIndex", Value::Raw("0".to_string())));
                } else {
                    let ext = paths::extension(name.as_str())
                        .or_else(|| paths::extension(path.as_str()));
                    let key = if file_type::has_explicit_file_type(ext) {
                        "explicitFileType"
                    } else {
                        "lastKnownFileType"
                    };
                    props.push((key, Value::Str(file_type::source_type(ext))));
                }
                if !name.is_empty() && name != path {
                    props.push(("name", Value::Str(name)));
                }
                props.push(("path", Value::Str(path)));
                let tree = if file_type.is_empty() {
                    "<group>"
                } else {
                    "BUILT_PRODUCTS_DIR"
                };
                props.push(("sourceTree", Value::Str(tree)));
            }
            Object::FrameworksBuildPhase { files }
            | Object::ResourcesBuildPhase { files }
            | Object::SourcesBuildPhase { files } => {
                props.push(("buildActionMask", Value::Raw("2147483647".to_string())));
                props.push(("files", Value::List(files.clone())));
                props.push((
                    "runOnlyForDeploymentPostprocessing",
                    Value::Raw("0".to_string()),
                ));
            }
            Object::Group {
                name,
                path,
                children,
            } => {
                props.push(("children", Value::List(children.clone())));
                if !name.is_empty() {
                    props.push(("name", Value::Str(name)));
                }
                if !path.is_empty() {
                    props.push(("path", Value::Str(path)));
                }
                props.push(("sourceTree", Value::Str("<group>")));
            }
            Object::NativeTarget(native) => {
                let data = &native.target;
                props.push(("buildConfigurationList", Value::Ref(data.configurations)));
                props.push(("buildPhases", Value::List(data.build_phases.clone())));
                props.push(("buildRules", Value::List(Vec::new())));
                props.push(("dependencies", Value::List(data.dependencies.clone())));
                props.push(("name", Value::Str(&data.name)));
                props.push(("productName", Value::Str(&native.product_name)));
                props.push(("productReference", Value::Ref(native.product_reference)));
                props.push(("productType", Value::Str(&native.product_type)));
            }
            Object::Project(project) => {
                props.push((
                    "attributes",
                    Value::Raw(project_attributes_block(PROPERTY_LEVEL)),
                ));
                props.push(("buildConfigurationList", Value::Ref(project.configurations)));
                props.push(("compatibilityVersion", Value::Str("Xcode 3.2")));
                props.push(("developmentRegion", Value::Str("en")));
                props.push(("hasScannedForEncodings", Value::Raw("1".to_string())));
                props.push(("knownRegions", Value::Raw(known_regions(PROPERTY_LEVEL))));
                props.push((
                    "mainGroup",
                    Value::Raw(arena.id(project.main_group).unwrap_or_default().to_string()),
                ));
                props.push(("projectDirPath", Value::Str("")));
                props.push(("projectRoot", Value::Str("")));
                props.push(("targets", Value::List(project.targets.clone())));
            }
            Object::ShellScriptBuildPhase { name, script } => {
                props.push(("buildActionMask", Value::Raw("2147483647".to_string())));
                props.push(("files", Value::List(Vec::new())));
                props.push(("inputPaths", Value::List(Vec::new())));
                props.push(("name", Value::Str(name)));
                props.push(("outputPaths", Value::List(Vec::new())));
                props.push((
                    "runOnlyForDeploymentPostprocessing",
                    Value::Raw("0".to_string()),
                ));
                props.push(("shellPath", Value::Str(SHELL_PATH)));
                props.push(("shellScript", Value::Str(script)));
                props.push(("showEnvVarsInLog", Value::Raw("0".to_string())));
            }
            Object::TargetDependency { target, proxy } => {
                props.push(("target", Value::Ref(*target)));
                props.push(("targetProxy", Value::Ref(*proxy)));
            }
            Object::BuildConfiguration { name, attributes } => {
                props.push(("buildSettings", Value::Map(attributes)));
                props.push(("name", Value::Str(name)));
            }
            Object::ConfigurationList { configurations, .. } => {
                props.push(("buildConfigurations", Value::List(configurations.clone())));
                props.push((
                    "defaultConfigurationIsVisible",
                    Value::Raw("1".to_string()),
                ));
                let default = configurations
                    .first()
                    .map(|&c| arena.name(c))
                    .unwrap_or_default();
                props.push(("defaultConfigurationName", Value::Raw(quote(&default))));
            }
        }
        props
    }
}

/// Indentation of the entries of the `objects` dictionary.
const OBJECT_INDENT: usize = 2;

/// Indentation of the properties of multi-line objects.
const PROPERTY_LEVEL: usize = OBJECT_INDENT + 1;

fn project_attributes_block(level: usize) -> String {
    let mut out = String::from("{\n");
    for (key, value) in [
        ("BuildIndependentTargetsInParallel", "YES"),
        ("LastUpgradeCheck", LAST_UPGRADE_CHECK),
    ] {
        push_tabs(&mut out, level + 1);
        let _ = writeln!(out, "{} = {};", key, value);
    }
    push_tabs(&mut out, level);
    out.push('}');
    out
}

fn known_regions(level: usize) -> String {
    let mut out = String::from("(\n");
    for region in ["en", "Base"] {
        push_tabs(&mut out, level + 1);
        let _ = writeln!(out, "{},", region);
    }
    push_tabs(&mut out, level);
    out.push(')');
    out
}

fn push_tabs(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push('\t');
    }
}

fn quote(s: &str) -> String {
    let mut out = String::new();
    write_string(&mut out, s);
    out
}

/// Whether `s` can be printed without quotes.
fn is_bare(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b'/'))
}

/// Print a string, quoting and escaping it when needed.
fn write_string(out: &mut String, s: &str) {
    if is_bare(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Serialize every object reachable from the project root.
///
/// Identifiers must have been assigned beforehand.
pub fn serialize(project: &PbxProject) -> String {
    let arena = project.arena();
    let mut printer = Printer {
        arena,
        out: String::new(),
    };

    printer.out.push_str(
        "// !$*UTF8*$!\n{\n\tarchiveVersion = 1;\n\tclasses = {\n\t};\n\tobjectVersion = 46;\n\tobjects = {\n",
    );

    let mut by_class: BTreeMap<ObjectClass, Vec<ObjectId>> = BTreeMap::new();
    arena.visit(project.root(), |obj| {
        by_class.entry(arena.class(obj)).or_default().push(obj);
    });

    for (class, mut objects) in by_class {
        objects.sort_by(|&a, &b| arena.id(a).cmp(&arena.id(b)));
        let _ = write!(printer.out, "\n/* Begin {} section */\n", class);
        for obj in objects {
            printer.object(obj, OBJECT_INDENT);
        }
        let _ = writeln!(printer.out, "/* End {} section */", class);
    }

    printer.out.push_str("\t};\n\trootObject = ");
    printer.out.push_str(&arena.reference(project.root()));
    printer.out.push_str(";\n}\n");
    printer.out
}
