//! Package types, platform scopes and UI sections.
//!
//! These small enums are shared by the provides parser, the scanner, the
//! conflict detector and the persisted document.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of installable package or source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageType {
    /// ReaScript (Lua, EEL or Python)
    Script,
    /// Native extension
    Extension,
    /// JSFX effect
    Effect,
    /// Arbitrary data files
    Data,
    /// Theme
    Theme,
    /// Language pack
    LangPack,
    /// Web interface page
    WebInterface,
    /// Project template
    ProjectTemplate,
    /// Track template
    TrackTemplate,
    /// MIDI note name map
    MidiNoteNames,
    /// Automation item
    AutomationItem,
}

impl PackageType {
    /// Every type, in serialization order.
    pub const ALL: [Self; 11] = [
        Self::Script,
        Self::Extension,
        Self::Effect,
        Self::Data,
        Self::Theme,
        Self::LangPack,
        Self::WebInterface,
        Self::ProjectTemplate,
        Self::TrackTemplate,
        Self::MidiNoteNames,
        Self::AutomationItem,
    ];

    /// Name used in the index document and in provides options.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Extension => "extension",
            Self::Effect => "effect",
            Self::Data => "data",
            Self::Theme => "theme",
            Self::LangPack => "langpack",
            Self::WebInterface => "webinterface",
            Self::ProjectTemplate => "projecttpl",
            Self::TrackTemplate => "tracktpl",
            Self::MidiNoteNames => "midinotenames",
            Self::AutomationItem => "autoitem",
        }
    }

    /// Classify a repository path by its file name suffix.
    ///
    /// Returns `None` for files that are not packages.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?;
        match ext {
            "lua" | "eel" | "py" => Some(Self::Script),
            "ext" => Some(Self::Extension),
            "jsfx" => Some(Self::Effect),
            other => other
                .parse()
                .ok()
                .filter(|t| !matches!(t, Self::Script | Self::Extension | Self::Effect)),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Platform scope of a source file.
///
/// Scopes form a fixed specialization tree rooted at [`Platform::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Platform {
    /// Every platform
    #[default]
    All,
    /// Any Windows
    Windows,
    /// 32-bit Windows
    Win32,
    /// 64-bit Windows
    Win64,
    /// Any macOS
    Darwin,
    /// 32-bit macOS
    Darwin32,
    /// 64-bit macOS
    Darwin64,
    /// Any Linux
    Linux,
    /// 32-bit Linux
    Linux32,
    /// 64-bit Linux
    Linux64,
}

impl Platform {
    /// Every platform scope.
    pub const ALL: [Self; 10] = [
        Self::All,
        Self::Windows,
        Self::Win32,
        Self::Win64,
        Self::Darwin,
        Self::Darwin32,
        Self::Darwin64,
        Self::Linux,
        Self::Linux32,
        Self::Linux64,
    ];

    /// Name used in the index document and in provides options.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Windows => "windows",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::Darwin => "darwin",
            Self::Darwin32 => "darwin32",
            Self::Darwin64 => "darwin64",
            Self::Linux => "linux",
            Self::Linux32 => "linux32",
            Self::Linux64 => "linux64",
        }
    }

    /// Direct parent in the specialization tree.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::All => None,
            Self::Windows | Self::Darwin | Self::Linux => Some(Self::All),
            Self::Win32 | Self::Win64 => Some(Self::Windows),
            Self::Darwin32 | Self::Darwin64 => Some(Self::Darwin),
            Self::Linux32 | Self::Linux64 => Some(Self::Linux),
        }
    }

    /// Distance from the universal scope.
    #[must_use]
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        let mut current = Some(other);
        while let Some(platform) = current {
            if platform == self {
                return true;
            }
            current = platform.parent();
        }
        false
    }

    /// Whether one scope contains the other.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Host UI section an action registers into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Main action list
    Main,
    /// MIDI editor
    MidiEditor,
    /// Inline MIDI editor
    MidiInlineEditor,
    /// MIDI event list editor
    MidiEventListEditor,
    /// Media explorer
    MediaExplorer,
}

impl Section {
    /// Every section.
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::MidiEditor,
        Self::MidiInlineEditor,
        Self::MidiEventListEditor,
        Self::MediaExplorer,
    ];

    /// Name used in the index document and in provides options.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::MidiEditor => "midi_editor",
            Self::MidiInlineEditor => "midi_inlineeditor",
            Self::MidiEventListEditor => "midi_eventlisteditor",
            Self::MediaExplorer => "mediaexplorer",
        }
    }

    /// Guess the section from a directory name.
    ///
    /// `"MIDI Editor"`, `"midi_editor"` and `"MIDI-Editor"` all map to
    /// [`Section::MidiEditor`]; unknown names map to [`Section::Main`].
    #[must_use]
    pub fn detect(directory: &str) -> Self {
        let key: String = directory
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "midieditor" => Self::MidiEditor,
            "midiinlineeditor" => Self::MidiInlineEditor,
            "midieventlisteditor" => Self::MidiEventListEditor,
            "mediaexplorer" => Self::MediaExplorer,
            _ => Self::Main,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_path() {
        assert_eq!(PackageType::from_path("Cat/a.lua"), Some(PackageType::Script));
        assert_eq!(PackageType::from_path("Cat/a.eel"), Some(PackageType::Script));
        assert_eq!(PackageType::from_path("Cat/a.py"), Some(PackageType::Script));
        assert_eq!(PackageType::from_path("Cat/a.jsfx"), Some(PackageType::Effect));
        assert_eq!(PackageType::from_path("Cat/a.ext"), Some(PackageType::Extension));
        assert_eq!(PackageType::from_path("Cat/a.theme"), Some(PackageType::Theme));
        assert_eq!(
            PackageType::from_path("Cat/a.autoitem"),
            Some(PackageType::AutomationItem)
        );
        assert_eq!(PackageType::from_path("Cat/a.png"), None);
        assert_eq!(PackageType::from_path("Cat/a.script"), None);
        assert_eq!(PackageType::from_path("Cat/a.effect"), None);
        assert_eq!(PackageType::from_path("README"), None);
    }

    #[test]
    fn test_platform_hierarchy() {
        assert_eq!(Platform::All.depth(), 0);
        assert_eq!(Platform::Darwin.depth(), 1);
        assert_eq!(Platform::Linux64.depth(), 2);

        assert!(Platform::All.contains(Platform::Win32));
        assert!(Platform::Windows.contains(Platform::Win64));
        assert!(Platform::Windows.contains(Platform::Windows));
        assert!(!Platform::Win64.contains(Platform::Windows));
        assert!(!Platform::Windows.contains(Platform::Darwin32));

        assert!(Platform::Win32.overlaps(Platform::All));
        assert!(!Platform::Windows.overlaps(Platform::Darwin));
        assert!(!Platform::Win32.overlaps(Platform::Win64));
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("darwin64".parse::<Platform>(), Ok(Platform::Darwin64));
        assert!("haiku".parse::<Platform>().is_err());
    }

    #[test]
    fn test_section_detection() {
        assert_eq!(Section::detect("MIDI Editor"), Section::MidiEditor);
        assert_eq!(Section::detect("midi_inlineeditor"), Section::MidiInlineEditor);
        assert_eq!(
            Section::detect("MIDI Event List Editor"),
            Section::MidiEventListEditor
        );
        assert_eq!(Section::detect("Media-Explorer"), Section::MediaExplorer);
        assert_eq!(Section::detect("Various"), Section::Main);
    }
}
