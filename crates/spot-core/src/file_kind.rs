use std::path::Path;

/// Coarse type of a result, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Folder,
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Image,
    Video,
    Audio,
    Text,
    Script,
    Archive,
    Generic,
}

impl FileKind {
    /// Classifies by extension only, without touching the filesystem.
    pub fn from_file_name(name: &str) -> Self {
        let Some((_, extension)) = name.rsplit_once('.') else {
            return FileKind::Generic;
        };

        match extension.to_ascii_lowercase().as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::Document,
            "xls" | "xlsx" => FileKind::Spreadsheet,
            "ppt" | "pptx" => FileKind::Presentation,
            "png" | "jpg" | "jpeg" | "gif" | "svg" => FileKind::Image,
            "mp4" | "mkv" | "avi" => FileKind::Video,
            "mp3" | "flac" | "ogg" => FileKind::Audio,
            "txt" | "md" => FileKind::Text,
            "js" | "ts" | "py" | "sh" => FileKind::Script,
            "zip" | "tar" | "gz" => FileKind::Archive,
            _ => FileKind::Generic,
        }
    }

    /// Classifies a path, checking whether it is a directory first.
    pub fn of_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            return FileKind::Folder;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(FileKind::Generic, FileKind::from_file_name)
    }

    /// Freedesktop symbolic icon name for the kind.
    pub fn icon_name(self) -> &'static str {
        match self {
            FileKind::Folder => "folder-symbolic",
            FileKind::Pdf => "application-pdf-symbolic",
            FileKind::Document => "x-office-document-symbolic",
            FileKind::Spreadsheet => "x-office-spreadsheet-symbolic",
            FileKind::Presentation => "x-office-presentation-symbolic",
            FileKind::Image => "image-x-generic-symbolic",
            FileKind::Video => "video-x-generic-symbolic",
            FileKind::Audio => "audio-x-generic-symbolic",
            FileKind::Script => "text-x-script-symbolic",
            FileKind::Archive => "package-x-generic-symbolic",
            FileKind::Text | FileKind::Generic => "text-x-generic-symbolic",
        }
    }
}
