/// Builds the technology identifier enum: each variant has a stored key and a
/// display name, and any other key round-trips through `Custom`.
macro_rules! technology_ids {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $key:literal : $display:literal $( | $alias:literal )* ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )*
            Custom(String),
        }

        impl $name {
            const KNOWN: &'static [$name] = &[ $( $name::$variant, )* ];

            /// Key under which the element is stored in an analysis
            pub fn key(&self) -> &str {
                match self {
                    $( Self::$variant => $key, )*
                    Self::Custom(key) => key,
                }
            }

            pub fn name(&self) -> &str {
                match self {
                    $( Self::$variant => $display, )*
                    Self::Custom(key) => key,
                }
            }

            /// Accepts keys, display names and aliases of known technologies
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $key | $display $( | $alias )* => Some(Self::$variant), )*
                    _ => None,
                }
            }

            pub fn known() -> &'static [$name] {
                Self::KNOWN
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.key())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let key = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(match key.as_str() {
                    $( $key => Self::$variant, )*
                    _ => Self::Custom(key),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

technology_ids! {
    /// Technology identifier keyed into `ProjectAnalysis::elements`
    TechnologyId {
        Node => "node" : "Node" | "nodejs" | "node.js",
        DotnetCore => "dotnetcore" : ".NET Core" | "dotnet" | "netcore",
        Docker => "docker" : "Docker",
        K8s => "k8s" : "Kubernetes" | "kubernetes",
        Travis => "travis" : "Travis CI" | "travis-ci",
        JHipster => "jhipster" : "JHipster",
        React => "react" : "React",
    }
}
