//! Mapping from file extensions to Xcode file types.

/// Extension to Xcode file type, sorted by extension for binary search.
const SOURCE_TYPE_FOR_EXT: &[(&str, &str)] = &[
    ("a", "archive.ar"),
    ("app", "wrapper.application"),
    ("appex", "wrapper.app-extension"),
    ("bdic", "file"),
    ("bundle", "wrapper.cfbundle"),
    ("c", "sourcecode.c.c"),
    ("cc", "sourcecode.cpp.cpp"),
    ("cpp", "sourcecode.cpp.cpp"),
    ("css", "text.css"),
    ("cxx", "sourcecode.cpp.cpp"),
    ("dart", "sourcecode"),
    ("dylib", "compiled.mach-o.dylib"),
    ("framework", "wrapper.framework"),
    ("h", "sourcecode.c.h"),
    ("hxx", "sourcecode.cpp.h"),
    ("icns", "image.icns"),
    ("java", "sourcecode.java"),
    ("js", "sourcecode.javascript"),
    ("kext", "wrapper.kext"),
    ("m", "sourcecode.c.objc"),
    ("mm", "sourcecode.cpp.objcpp"),
    ("nib", "wrapper.nib"),
    ("o", "compiled.mach-o.objfile"),
    ("pdf", "image.pdf"),
    ("pl", "text.script.perl"),
    ("plist", "text.plist.xml"),
    ("pm", "text.script.perl"),
    ("png", "image.png"),
    ("py", "text.script.python"),
    ("r", "sourcecode.rez"),
    ("rez", "sourcecode.rez"),
    ("s", "sourcecode.asm"),
    ("storyboard", "file.storyboard"),
    ("strings", "text.plist.strings"),
    ("swift", "sourcecode.swift"),
    ("ttf", "file"),
    ("xcassets", "folder.assetcatalog"),
    ("xcconfig", "text.xcconfig"),
    ("xcdatamodel", "wrapper.xcdatamodel"),
    ("xcdatamodeld", "wrapper.xcdatamodeld"),
    ("xctest", "wrapper.cfbundle"),
    ("xib", "file.xib"),
    ("y", "sourcecode.yacc"),
];

/// Xcode file type for a file extension; `text` when unknown.
pub fn source_type(ext: Option<&str>) -> &'static str {
    ext.and_then(|ext| {
        SOURCE_TYPE_FOR_EXT
            .binary_search_by(|(e, _)| (*e).cmp(ext))
            .ok()
            .map(|i| SOURCE_TYPE_FOR_EXT[i].1)
    })
    .unwrap_or("text")
}

/// Whether the type must be printed as `explicitFileType` rather than
/// `lastKnownFileType`.
pub fn has_explicit_file_type(ext: Option<&str>) -> bool {
    ext == Some("dart")
}

/// Whether files with this extension go into a target's sources build phase.
pub fn is_source_file_for_indexing(ext: Option<&str>) -> bool {
    matches!(
        ext,
        Some("c" | "cc" | "cpp" | "cxx" | "m" | "mm" | "swift")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(SOURCE_TYPE_FOR_EXT.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_source_type() {
        assert_eq!(source_type(Some("mm")), "sourcecode.cpp.objcpp");
        assert_eq!(source_type(Some("app")), "wrapper.application");
        assert_eq!(source_type(Some("gn")), "text");
        assert_eq!(source_type(None), "text");
    }

    #[test]
    fn test_indexing_extensions() {
        assert!(is_source_file_for_indexing(Some("mm")));
        assert!(!is_source_file_for_indexing(Some("h")));
        assert!(!is_source_file_for_indexing(None));
    }
}
