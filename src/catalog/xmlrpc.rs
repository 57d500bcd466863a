//! Minimal XML-RPC codec: enough to build a `methodCall` and read back a
//! `methodResponse` or a `fault`.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Member of a struct value, by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XmlRpcError {
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

fn malformed(reason: impl std::fmt::Display) -> XmlRpcError {
    XmlRpcError::Malformed(reason.to_string())
}

/// Serialize a call to `method` with positional `params`.
pub fn method_call(method: &str, params: &[Value]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    for param in params {
        xml.push_str("<param>");
        write_value(&mut xml, param);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn write_value(xml: &mut String, value: &Value) {
    xml.push_str("<value>");
    match value {
        Value::String(s) => {
            xml.push_str("<string>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</string>");
        }
        Value::Int(i) => xml.push_str(&format!("<int>{}</int>", i)),
        Value::Bool(b) => xml.push_str(&format!("<boolean>{}</boolean>", u8::from(*b))),
        Value::Double(d) => xml.push_str(&format!("<double>{}</double>", d)),
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                write_value(xml, item);
            }
            xml.push_str("</data></array>");
        }
        Value::Struct(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                write_value(xml, member);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
        Value::Nil => xml.push_str("<nil/>"),
    }
    xml.push_str("</value>");
}

/// Parse a `methodResponse`, returning its single parameter or the fault it
/// carries.
pub fn parse_response(body: &str) -> Result<Value, XmlRpcError> {
    let mut parser = Parser::new(body);
    parser.expect_start("methodResponse")?;
    match parser.next_tag()? {
        Tag::Start(name) if name == "params" => {
            parser.expect_start("param")?;
            parser.expect_start("value")?;
            let value = parser.value()?;
            parser.expect_end("param")?;
            parser.expect_end("params")?;
            parser.expect_end("methodResponse")?;
            Ok(value)
        }
        Tag::Start(name) if name == "fault" => {
            parser.expect_start("value")?;
            let fault = parser.value()?;
            let code = match fault.member("faultCode") {
                Some(Value::Int(code)) => *code,
                _ => 0,
            };
            let message = fault
                .member("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Err(XmlRpcError::Fault { code, message })
        }
        other => Err(malformed(format!("unexpected {}", other))),
    }
}

/// Structural events, with whitespace between elements dropped.
#[derive(Debug, PartialEq)]
enum Tag {
    Start(String),
    Empty(String),
    End(String),
    Text(String),
    Eof,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Start(name) => write!(f, "<{}>", name),
            Tag::Empty(name) => write!(f, "<{}/>", name),
            Tag::End(name) => write!(f, "</{}>", name),
            Tag::Text(text) => write!(f, "text '{}'", text),
            Tag::Eof => write!(f, "end of document"),
        }
    }
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            reader: Reader::from_str(body),
        }
    }

    fn name(start: &BytesStart<'_>) -> String {
        String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
    }

    /// Next event, text included.
    fn next_raw(&mut self) -> Result<Tag, XmlRpcError> {
        loop {
            let tag = match self.reader.read_event().map_err(malformed)? {
                Event::Start(e) => Tag::Start(Self::name(&e)),
                Event::Empty(e) => Tag::Empty(Self::name(&e)),
                Event::End(e) => Tag::End(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
                Event::Text(t) => Tag::Text(t.unescape().map_err(malformed)?.into_owned()),
                Event::CData(c) => Tag::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
                Event::Eof => Tag::Eof,
                _ => continue,
            };
            return Ok(tag);
        }
    }

    /// Next element event, skipping whitespace text.
    fn next_tag(&mut self) -> Result<Tag, XmlRpcError> {
        loop {
            match self.next_raw()? {
                Tag::Text(text) if text.trim().is_empty() => continue,
                tag => return Ok(tag),
            }
        }
    }

    fn expect_start(&mut self, expected: &str) -> Result<(), XmlRpcError> {
        match self.next_tag()? {
            Tag::Start(name) if name == expected => Ok(()),
            other => Err(malformed(format!("expected <{}>, found {}", expected, other))),
        }
    }

    fn expect_end(&mut self, expected: &str) -> Result<(), XmlRpcError> {
        match self.next_tag()? {
            Tag::End(name) if name == expected => Ok(()),
            other => Err(malformed(format!("expected </{}>, found {}", expected, other))),
        }
    }

    /// Text content up to the closing `element` tag.
    fn text(&mut self, element: &str) -> Result<String, XmlRpcError> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Tag::Text(t) => text.push_str(&t),
                Tag::End(name) if name == element => return Ok(text),
                other => {
                    return Err(malformed(format!("unexpected {} in <{}>", other, element)));
                }
            }
        }
    }

    /// Parse the content of a `<value>` whose start tag was just read,
    /// consuming its end tag.
    fn value(&mut self) -> Result<Value, XmlRpcError> {
        // Untyped content is a string; whitespace before a type tag is not.
        let mut untyped = String::new();
        let value = loop {
            match self.next_raw()? {
                Tag::Text(t) => untyped.push_str(&t),
                Tag::End(name) if name == "value" => return Ok(Value::String(untyped)),
                Tag::Start(name) if untyped.trim().is_empty() => break self.typed(&name)?,
                Tag::Empty(name) if untyped.trim().is_empty() => break empty_value(&name)?,
                other => return Err(malformed(format!("unexpected {} in <value>", other))),
            }
        };
        self.expect_end("value")?;
        Ok(value)
    }

    fn typed(&mut self, kind: &str) -> Result<Value, XmlRpcError> {
        match kind {
            "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(self.text(kind)?)),
            "int" | "i4" | "i8" => {
                let text = self.text(kind)?;
                text.trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| malformed(format!("'{}' is not an integer", text)))
            }
            "boolean" => match self.text(kind)?.trim() {
                "1" => Ok(Value::Bool(true)),
                "0" => Ok(Value::Bool(false)),
                other => Err(malformed(format!("'{}' is not a boolean", other))),
            },
            "double" => {
                let text = self.text(kind)?;
                text.trim()
                    .parse()
                    .map(Value::Double)
                    .map_err(|_| malformed(format!("'{}' is not a double", text)))
            }
            "array" => {
                let mut items = Vec::new();
                match self.next_tag()? {
                    Tag::Start(name) if name == "data" => loop {
                        match self.next_tag()? {
                            Tag::Start(name) if name == "value" => items.push(self.value()?),
                            Tag::End(name) if name == "data" => break,
                            other => return Err(malformed(format!("unexpected {} in <data>", other))),
                        }
                    },
                    Tag::Empty(name) if name == "data" => {}
                    other => return Err(malformed(format!("expected <data>, found {}", other))),
                }
                self.expect_end("array")?;
                Ok(Value::Array(items))
            }
            "struct" => {
                let mut members = Vec::new();
                loop {
                    match self.next_tag()? {
                        Tag::Start(name) if name == "member" => {
                            self.expect_start("name")?;
                            let name = self.text("name")?;
                            self.expect_start("value")?;
                            let value = self.value()?;
                            self.expect_end("member")?;
                            members.push((name, value));
                        }
                        Tag::End(name) if name == "struct" => break,
                        other => {
                            return Err(malformed(format!("unexpected {} in <struct>", other)));
                        }
                    }
                }
                Ok(Value::Struct(members))
            }
            other => Err(malformed(format!("unknown value type <{}>", other))),
        }
    }
}

fn empty_value(kind: &str) -> Result<Value, XmlRpcError> {
    match kind {
        "nil" => Ok(Value::Nil),
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(String::new())),
        "array" => Ok(Value::Array(Vec::new())),
        "struct" => Ok(Value::Struct(Vec::new())),
        other => Err(malformed(format!("empty <{}/> has no value", other))),
    }
}
