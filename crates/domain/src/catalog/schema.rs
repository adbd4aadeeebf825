use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Column type in the Hive DDL dialect understood by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    String,
    Binary,
    Date,
    Timestamp,
    Decimal { precision: u8, scale: u8 },
    Char(u32),
    Varchar(u32),
    Array(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Struct(Vec<StructField>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructField {
    pub name: String,
    pub field_type: ColumnType,
}

impl ColumnType {
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            ColumnType::Array(_) | ColumnType::Map(..) | ColumnType::Struct(_)
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::TinyInt => f.write_str("tinyint"),
            ColumnType::SmallInt => f.write_str("smallint"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::BigInt => f.write_str("bigint"),
            ColumnType::Float => f.write_str("float"),
            ColumnType::Double => f.write_str("double"),
            ColumnType::String => f.write_str("string"),
            ColumnType::Binary => f.write_str("binary"),
            ColumnType::Date => f.write_str("date"),
            ColumnType::Timestamp => f.write_str("timestamp"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            ColumnType::Char(length) => write!(f, "char({})", length),
            ColumnType::Varchar(length) => write!(f, "varchar({})", length),
            ColumnType::Array(item) => write!(f, "array<{}>", item),
            ColumnType::Map(key, value) => write!(f, "map<{},{}>", key, value),
            ColumnType::Struct(fields) => {
                f.write_str("struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", field.name, field.field_type)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            input,
            pos: 0,
            depth: 0,
        };
        let column_type = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != input.len() {
            return Err(parser.error(format!("unexpected trailing input at {}", parser.pos)));
        }
        Ok(column_type)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

/// Deepest nesting of array, map and struct accepted in one type string.
const MAX_NESTING: usize = 64;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidColumnType {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn expect(&mut self, token: char) -> Result<(), Error> {
        self.skip_whitespace();
        if self.rest().starts_with(token) {
            self.pos += token.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at {}", token, self.pos)))
        }
    }

    fn identifier(&mut self) -> Result<&'a str, Error> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error(format!("expected identifier at {}", self.pos)));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn number(&mut self) -> Result<u32, Error> {
        let digits = self.identifier()?;
        digits
            .parse()
            .map_err(|_| self.error(format!("expected number, found {:?}", digits)))
    }

    fn parse_type(&mut self) -> Result<ColumnType, Error> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("nesting deeper than {} levels", MAX_NESTING)));
        }
        self.depth += 1;
        let column_type = self.parse_keyword();
        self.depth -= 1;
        column_type
    }

    fn parse_keyword(&mut self) -> Result<ColumnType, Error> {
        let keyword = self.identifier()?.to_ascii_lowercase();

        let column_type = match keyword.as_str() {
            "boolean" => ColumnType::Boolean,
            "tinyint" => ColumnType::TinyInt,
            "smallint" => ColumnType::SmallInt,
            "int" | "integer" => ColumnType::Int,
            "bigint" => ColumnType::BigInt,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "string" => ColumnType::String,
            "binary" => ColumnType::Binary,
            "date" => ColumnType::Date,
            "timestamp" => ColumnType::Timestamp,
            "decimal" => {
                self.expect('(')?;
                let precision = self.number()?;
                self.expect(',')?;
                let scale = self.number()?;
                self.expect(')')?;
                if precision == 0 || precision > 38 || scale > precision {
                    return Err(self.error(format!(
                        "decimal({},{}) is out of range",
                        precision, scale
                    )));
                }
                ColumnType::Decimal {
                    precision: precision as u8,
                    scale: scale as u8,
                }
            }
            "char" => {
                self.expect('(')?;
                let length = self.number()?;
                self.expect(')')?;
                ColumnType::Char(length)
            }
            "varchar" => {
                self.expect('(')?;
                let length = self.number()?;
                self.expect(')')?;
                ColumnType::Varchar(length)
            }
            "array" => {
                self.expect('<')?;
                let item = self.parse_type()?;
                self.expect('>')?;
                ColumnType::Array(Box::new(item))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                if !key.is_primitive() {
                    return Err(self.error("map keys must be primitive"));
                }
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                ColumnType::Map(Box::new(key), Box::new(value))
            }
            "struct" => {
                self.expect('<')?;
                let mut fields = Vec::new();
                loop {
                    let name = self.identifier()?.to_string();
                    self.expect(':')?;
                    let field_type = self.parse_type()?;
                    fields.push(StructField { name, field_type });

                    self.skip_whitespace();
                    if self.rest().starts_with(',') {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                self.expect('>')?;
                ColumnType::Struct(fields)
            }
            other => return Err(self.error(format!("unknown type {:?}", other))),
        };

        Ok(column_type)
    }
}
