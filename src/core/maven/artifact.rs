use crate::core::error::{LauncherError, LauncherResult};

/// Library coordinate as written in version JSON `name` fields:
/// `group:artifact:version[:classifier][@extension]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            _ => (coord, "jar"),
        };

        let mut parts = coord_part.split(':');
        let (Some(group_id), Some(artifact_id), Some(version)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        };
        let classifier = parts.next().map(str::to_string);
        if parts.next().is_some() || [group_id, artifact_id, version].iter().any(|p| p.is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        Ok(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact_id, self.version, c, self.extension),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// `group/with/slashes/artifact/version/file`, always `/`-separated.
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.file_name()
        )
    }

    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repository_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_classified_coordinates() {
        let a = MavenArtifact::parse("net.sf.jopt-simple:jopt-simple:5.0.4").unwrap();
        assert_eq!(a.group_id, "net.sf.jopt-simple");
        assert_eq!(a.classifier, None);
        assert_eq!(a.extension, "jar");

        let b = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.3:natives-windows").unwrap();
        assert_eq!(b.classifier.as_deref(), Some("natives-windows"));

        let c = MavenArtifact::parse("de.oceanlabs.mcp:mcp_config:1.20.1@zip").unwrap();
        assert_eq!(c.extension, "zip");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(MavenArtifact::parse("just-a-name").is_err());
        assert!(MavenArtifact::parse("a::1.0").is_err());
        assert!(MavenArtifact::parse("a:b:c:d:e").is_err());
    }

    #[test]
    fn url_and_repository_path() {
        let a = MavenArtifact::parse("net.fabricmc:intermediary:1.20.1").unwrap();
        assert_eq!(
            a.url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar"
        );

        let native = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.3")
            .unwrap()
            .with_classifier("natives-linux");
        assert_eq!(
            native.repository_path(),
            "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-linux.jar"
        );
    }
}
