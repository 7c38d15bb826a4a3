//! Minimal MapServer mapfile reader.
//!
//! Only LAYER blocks, their NAME and their METADATA are extracted; every
//! other block is walked just far enough to find its END. INCLUDE directives
//! are spliced in before parsing.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Deepest INCLUDE nesting followed, as in MapServer.
pub const MAX_INCLUDE_DEPTH: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapfileError {
    #[error("Unterminated string starting on line {0}")]
    UnterminatedString(usize),

    #[error("Unexpected END on line {0}")]
    UnexpectedEnd(usize),

    #[error("Missing END for {0} block")]
    UnclosedBlock(String),

    #[error("Metadata key '{0}' has no value")]
    MissingValue(String),

    #[error("INCLUDE on line {0} has no quoted file name")]
    MissingInclude(usize),

    #[error("INCLUDE nested deeper than {0} levels")]
    IncludeDepth(usize),

    #[error("Cannot include {path}: {reason}")]
    Include { path: String, reason: String },
}

/// Blocks that contain nested keywords and close with END.
const BLOCKS: &[&str] = &[
    "CLASS",
    "CLUSTER",
    "COMPOSITE",
    "FEATURE",
    "GRID",
    "JOIN",
    "LABEL",
    "LEADER",
    "LEGEND",
    "MAP",
    "OUTPUTFORMAT",
    "QUERYMAP",
    "REFERENCE",
    "SCALEBAR",
    "SCALETOKEN",
    "STYLE",
    "VALIDATION",
    "WEB",
];

/// Blocks holding a flat list of values up to END.
const VALUE_BLOCKS: &[&str] = &["PATTERN", "POINTS", "PROJECTION", "VALUES"];

/// A LAYER block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapfileLayer {
    pub name: Option<String>,
    /// METADATA entries, keys lowercased
    pub metadata: BTreeMap<String, String>,
}

/// A parsed mapfile: the MAP name and every LAYER found at any depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapfile {
    pub name: Option<String>,
    pub layers: Vec<MapfileLayer>,
}

impl Mapfile {
    /// Parse a self-contained mapfile; any INCLUDE is an error.
    pub fn parse(src: &str) -> Result<Self, MapfileError> {
        Self::parse_with_includes(src, Path::new(""), |_| {
            Err("includes are only followed when reading from disk".to_string())
        })
    }

    /// Parse a mapfile, splicing in every INCLUDE.
    ///
    /// Include paths are joined to the directory of the including file
    /// (`dir` for the top-level source) and handed to `load`.
    pub fn parse_with_includes<F>(src: &str, dir: &Path, mut load: F) -> Result<Self, MapfileError>
    where
        F: FnMut(&Path) -> Result<String, String>,
    {
        let tokens = expand_includes(tokenize(src)?, dir, &mut load, 0)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            mapfile: Mapfile::default(),
        };
        parser.items(Context::Root)?;
        Ok(parser.mapfile)
    }

    /// Layer with the given NAME (case-insensitive).
    pub fn layer(&self, name: &str) -> Option<&MapfileLayer> {
        self.layers.iter().find(|l| {
            l.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Token::Word(s) | Token::Str(s) => s,
        }
    }

    fn keyword(&self) -> Option<String> {
        match self {
            Token::Word(s) => Some(s.to_ascii_uppercase()),
            Token::Str(_) => None,
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, MapfileError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' | '\'' => {
                let quote = c;
                let start = line;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        Some(c) if c == quote => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            value.push(c);
                        }
                        None => return Err(MapfileError::UnterminatedString(start)),
                    }
                }
                tokens.push((Token::Str(value), start));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '"' || c == '\'' || c == '#' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((Token::Word(word), line));
            }
        }
    }

    Ok(tokens)
}

fn expand_includes<F>(
    tokens: Vec<(Token, usize)>,
    dir: &Path,
    load: &mut F,
    depth: usize,
) -> Result<Vec<(Token, usize)>, MapfileError>
where
    F: FnMut(&Path) -> Result<String, String>,
{
    let mut expanded = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();

    while let Some((token, line)) = tokens.next() {
        if token.keyword().as_deref() != Some("INCLUDE") {
            expanded.push((token, line));
            continue;
        }
        let Some((Token::Str(file), _)) = tokens.next() else {
            return Err(MapfileError::MissingInclude(line));
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(MapfileError::IncludeDepth(MAX_INCLUDE_DEPTH));
        }

        let path = dir.join(&file);
        let src = load(&path).map_err(|reason| MapfileError::Include {
            path: path.display().to_string(),
            reason,
        })?;
        let nested_dir = path.parent().unwrap_or(dir);
        expanded.extend(expand_includes(tokenize(&src)?, nested_dir, load, depth + 1)?);
    }

    Ok(expanded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Root,
    Map,
    Layer(usize),
    SymbolSet,
    Other,
}

/// `SYMBOL` defines a symbol at the top of MAP or a symbol set; anywhere
/// else (STYLE, LABEL, CLASS) it is an attribute naming one.
fn symbol_opens_block(context: Context) -> bool {
    matches!(context, Context::Root | Context::Map | Context::SymbolSet)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    mapfile: Mapfile,
}

impl Parser {
    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Consume items until the END closing `context` (or EOF at root).
    fn items(&mut self, context: Context) -> Result<(), MapfileError> {
        while let Some((token, line)) = self.next() {
            let Some(keyword) = token.keyword() else {
                continue;
            };

            match keyword.as_str() {
                "END" => {
                    return match context {
                        Context::Root => Err(MapfileError::UnexpectedEnd(line)),
                        _ => Ok(()),
                    };
                }
                "LAYER" => {
                    self.mapfile.layers.push(MapfileLayer::default());
                    let index = self.mapfile.layers.len() - 1;
                    self.items(Context::Layer(index))?;
                }
                "MAP" => self.items(Context::Map)?,
                "NAME" => {
                    let value = self.peek().map(|t| t.text().to_string());
                    match (context, value) {
                        (Context::Layer(i), Some(v)) => {
                            self.pos += 1;
                            self.mapfile.layers[i].name = Some(v);
                        }
                        (Context::Map, Some(v)) => {
                            self.pos += 1;
                            self.mapfile.name = Some(v);
                        }
                        _ => {}
                    }
                }
                "METADATA" => {
                    let metadata = self.metadata()?;
                    if let Context::Layer(i) = context {
                        self.mapfile.layers[i].metadata.extend(metadata);
                    }
                }
                "SYMBOLSET" if matches!(self.peek(), Some(Token::Word(_))) => {
                    self.items(Context::SymbolSet)?
                }
                "SYMBOL" if symbol_opens_block(context) => self.items(Context::Other)?,
                k if VALUE_BLOCKS.contains(&k) => self.skip_values(k)?,
                k if BLOCKS.contains(&k) => self.items(Context::Other)?,
                _ => {}
            }
        }

        match context {
            Context::Root => Ok(()),
            Context::Map => Err(MapfileError::UnclosedBlock("MAP".to_string())),
            Context::Layer(_) => Err(MapfileError::UnclosedBlock("LAYER".to_string())),
            Context::SymbolSet => Err(MapfileError::UnclosedBlock("SYMBOLSET".to_string())),
            Context::Other => Err(MapfileError::UnclosedBlock("nested".to_string())),
        }
    }

    fn metadata(&mut self) -> Result<BTreeMap<String, String>, MapfileError> {
        let mut metadata = BTreeMap::new();
        loop {
            let Some((key, _)) = self.next() else {
                return Err(MapfileError::UnclosedBlock("METADATA".to_string()));
            };
            if key.keyword().as_deref() == Some("END") {
                return Ok(metadata);
            }
            let Some((value, _)) = self.next() else {
                return Err(MapfileError::MissingValue(key.text().to_string()));
            };
            metadata.insert(key.text().to_ascii_lowercase(), value.text().to_string());
        }
    }

    fn skip_values(&mut self, block: &str) -> Result<(), MapfileError> {
        while let Some((token, _)) = self.next() {
            if token.keyword().as_deref() == Some("END") {
                return Ok(());
            }
        }
        Err(MapfileError::UnclosedBlock(block.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GLOBAL: &str = r##"
MAP
  NAME "weather"
  # comment with LAYER keyword inside
  WEB
    METADATA
      "wms_title" "Weather"
    END
  END
  PROJECTION
    "init=epsg:4326"
  END
  LAYER
    NAME "GDPS.ETA_TT"
    TYPE RASTER
    STATUS ON
    METADATA
      "wms_title"       "Air temperature"
      "WMS_TIMEEXTENT"  "2024-01-01T00:00:00Z/2024-01-03T00:00:00Z/PT3H"
      "wms_timedefault" "2024-01-01T12:00:00Z"
      "wms_reference_time_extent" "2023-12-31T12:00:00Z,2024-01-01T00:00:00Z"
      "wms_reference_time_default" "2024-01-01T00:00:00Z"
    END
    CLASS
      NAME "warm"
      EXPRESSION ([pixel] > 0)
      STYLE
        COLOR "#ff0000"
        SYMBOL 'circle'
      END
    END
  END
  LAYER
    NAME 'RADAR_1KM_RRAI'
    METADATA
      'wms_timeextent' '2024-01-01T00:00:00Z/2024-01-01T03:00:00Z/PT6M'
      'wms_timedefault' '2024-01-01T00:06:00Z'
    END
  END
END
"##;

    #[test]
    fn test_parse_global_mapfile() {
        let map = Mapfile::parse(GLOBAL).unwrap();
        assert_eq!(map.name.as_deref(), Some("weather"));
        assert_eq!(map.layers.len(), 2);

        let tt = map.layer("GDPS.ETA_TT").unwrap();
        assert_eq!(
            tt.metadata.get("wms_timeextent").map(String::as_str),
            Some("2024-01-01T00:00:00Z/2024-01-03T00:00:00Z/PT3H")
        );
        assert_eq!(tt.metadata.len(), 5);

        let radar = map.layer("radar_1km_rrai").unwrap();
        assert_eq!(radar.name.as_deref(), Some("RADAR_1KM_RRAI"));
        assert!(!radar.metadata.contains_key("wms_reference_time_extent"));
    }

    #[test]
    fn test_class_name_does_not_rename_layer() {
        let map = Mapfile::parse(GLOBAL).unwrap();
        assert!(map.layer("warm").is_none());
    }

    #[test]
    fn test_bare_layer_file() {
        let src = "LAYER NAME \"X\" METADATA \"wms_timeextent\" \"a,b\" END END";
        let map = Mapfile::parse(src).unwrap();
        assert_eq!(map.name, None);
        assert_eq!(map.layers[0].name.as_deref(), Some("X"));
    }

    #[test]
    fn test_symbol_block_in_symbolset() {
        let src = r#"
SYMBOL
  NAME "circle"
  TYPE ELLIPSE
  POINTS 1 1 END
END
LAYER NAME "Y" END
"#;
        let map = Mapfile::parse(src).unwrap();
        assert_eq!(map.layers.len(), 1);
        assert_eq!(map.layers[0].name.as_deref(), Some("Y"));
    }

    #[test]
    fn test_unquoted_symbol_name_in_style() {
        let src = r#"
MAP
  SYMBOL
    NAME "circle"
    TYPE ELLIPSE
    POINTS 1 1 END
  END
  LAYER
    NAME "A"
    CLASS
      STYLE SYMBOL circle SIZE 4 END
      LABEL STYLE SYMBOL square END END
    END
  END
  LAYER NAME "B" END
END
"#;
        let map = Mapfile::parse(src).unwrap();
        let names: Vec<_> = map.layers.iter().filter_map(|l| l.name.as_deref()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_symbolset_file() {
        let src = "SYMBOLSET SYMBOL NAME 'dot' TYPE ELLIPSE END END";
        assert!(Mapfile::parse(src).unwrap().layers.is_empty());
    }

    #[test]
    fn test_includes_are_spliced() {
        let mut loaded = Vec::new();
        let map = Mapfile::parse_with_includes(
            "MAP NAME 'root' INCLUDE 'layers/all.map' END",
            Path::new("/maps"),
            |path| {
                loaded.push(path.to_path_buf());
                match path.to_str() {
                    Some("/maps/layers/all.map") => Ok("INCLUDE 'radar.map' LAYER NAME 'A' END".into()),
                    Some("/maps/layers/radar.map") => Ok("LAYER NAME 'RADAR' END".into()),
                    _ => Err("not found".into()),
                }
            },
        )
        .unwrap();

        assert_eq!(map.name.as_deref(), Some("root"));
        let names: Vec<_> = map.layers.iter().filter_map(|l| l.name.as_deref()).collect();
        assert_eq!(names, vec!["RADAR", "A"]);
        assert_eq!(
            loaded,
            vec![
                PathBuf::from("/maps/layers/all.map"),
                PathBuf::from("/maps/layers/radar.map")
            ]
        );
    }

    #[test]
    fn test_include_errors() {
        assert!(matches!(
            Mapfile::parse("MAP INCLUDE 'x.map' END"),
            Err(MapfileError::Include { .. })
        ));
        assert_eq!(
            Mapfile::parse("MAP INCLUDE END"),
            Err(MapfileError::MissingInclude(1))
        );

        let looping = Mapfile::parse_with_includes("INCLUDE 'self.map'", Path::new("/maps"), |_| {
            Ok("INCLUDE 'self.map'".to_string())
        });
        assert_eq!(looping, Err(MapfileError::IncludeDepth(MAX_INCLUDE_DEPTH)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Mapfile::parse("LAYER NAME \"X"),
            Err(MapfileError::UnterminatedString(1))
        );
        assert_eq!(
            Mapfile::parse("LAYER NAME \"X\""),
            Err(MapfileError::UnclosedBlock("LAYER".to_string()))
        );
        assert_eq!(Mapfile::parse("\nEND"), Err(MapfileError::UnexpectedEnd(2)));
        assert_eq!(
            Mapfile::parse("LAYER METADATA \"wms_timeextent\""),
            Err(MapfileError::MissingValue("wms_timeextent".to_string()))
        );
    }
}
