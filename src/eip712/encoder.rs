//! EIP-712 Type Encoding
//!
//! Implements `encodeType`, `typeHash` and `encodeData` for typed data.
//! Every encoded member is exactly one 32-byte word.

use super::types::*;
use crate::utils::crypto::{is_mixed_case, keccak256, to_checksum_address};
use ethers_core::types::U256;
use std::collections::BTreeSet;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)Dep1(...)Dep2(...)"
pub fn encode_type(type_name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    // Primary type first, then dependencies alphabetically
    let mut result = format_type_string(type_name, fields);

    for dep in find_type_dependencies(type_name, types) {
        if dep == type_name {
            continue;
        }
        if let Some(dep_fields) = types.get(&dep) {
            result.push_str(&format_type_string(&dep, dep_fields));
        }
    }

    Ok(result)
}

/// Format a single type string
fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Find all struct types reachable from `type_name`, including itself
///
/// Returned sorted by name.
pub fn find_type_dependencies(type_name: &str, types: &Types) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();
    let mut to_visit = vec![type_name.to_string()];

    while let Some(current) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }

        if let Some(fields) = types.get(&current) {
            dependencies.insert(current.clone());

            for field in fields {
                let base_type = get_base_type(&field.type_name);
                if types.contains_key(base_type) && !dependencies.contains(base_type) {
                    to_visit.push(base_type.to_string());
                }
            }
        }
    }

    dependencies
}

/// Calculate the type hash for a struct type
/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// Encode a struct: typeHash || encodeData(field_1) || ... || encodeData(field_n)
pub fn encode_struct(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    let obj = value.as_object().ok_or_else(|| invalid_value(type_name, value))?;

    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    for field in fields {
        let field_value = obj
            .get(&field.name)
            .ok_or_else(|| Eip712Error::MissingField(format!("{}.{}", type_name, field.name)))?;

        encoded.extend_from_slice(&encode_field(&field.type_name, field_value, types)?);
    }

    Ok(encoded)
}

/// Encode a single member as one 32-byte word
///
/// Structs, arrays and dynamic values are replaced by their keccak256 hash.
pub fn encode_field(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    if type_name.ends_with(']') {
        return Ok(keccak256(&encode_array(type_name, value, types)?));
    }

    if types.contains_key(type_name) {
        return Ok(keccak256(&encode_struct(type_name, value, types)?));
    }

    match type_name {
        "string" => {
            let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => {
            let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
            Ok(keccak256(&parse_hex(s)?))
        }
        _ => encode_atomic(type_name, value),
    }
}

/// Encode an array value as the concatenation of its encoded elements
fn encode_array(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    let arr = value.as_array().ok_or_else(|| invalid_value(type_name, value))?;

    // "T[2][]" -> element "T[2]", length ""
    let bracket_pos = type_name
        .rfind('[')
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
    let element_type = &type_name[..bracket_pos];
    let length_suffix = &type_name[bracket_pos + 1..type_name.len() - 1];

    if !length_suffix.is_empty() {
        let expected: usize = length_suffix
            .parse()
            .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
        if arr.len() != expected {
            return Err(Eip712Error::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("expected {} elements, got {}", expected, arr.len()),
            });
        }
    }

    let mut encoded = Vec::with_capacity(32 * arr.len());
    for item in arr {
        encoded.extend_from_slice(&encode_field(element_type, item, types)?);
    }

    Ok(encoded)
}

/// Encode an atomic (fixed-size) value
fn encode_atomic(type_name: &str, value: &serde_json::Value) -> Result<[u8; 32], Eip712Error> {
    let mut result = [0u8; 32];

    if type_name == "address" {
        let addr = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        result[12..].copy_from_slice(&parse_address(addr)?);
        return Ok(result);
    }

    if type_name == "bool" {
        let b = value.as_bool().ok_or_else(|| invalid_value(type_name, value))?;
        result[31] = u8::from(b);
        return Ok(result);
    }

    if let Some(bits) = integer_bits(type_name) {
        if !is_atomic_type(type_name) {
            return Err(Eip712Error::InvalidType(type_name.to_string()));
        }
        let word = if type_name.starts_with("uint") {
            encode_uint(type_name, bits, value)?
        } else {
            encode_int(type_name, bits, value)?
        };
        word.to_big_endian(&mut result);
        return Ok(result);
    }

    // bytesN, right-padded
    if let Some(size) = type_name.strip_prefix("bytes") {
        let size: usize = size
            .parse()
            .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
        if size == 0 || size > 32 {
            return Err(Eip712Error::InvalidType(type_name.to_string()));
        }

        let hex_str = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        let bytes = parse_hex(hex_str)?;
        if bytes.len() > size {
            return Err(Eip712Error::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("bytes too long: {} > {}", bytes.len(), size),
            });
        }

        result[..bytes.len()].copy_from_slice(&bytes);
        return Ok(result);
    }

    Err(Eip712Error::InvalidType(type_name.to_string()))
}

/// Encode a `uintN`, rejecting values wider than N bits
fn encode_uint(type_name: &str, bits: u32, value: &serde_json::Value) -> Result<U256, Eip712Error> {
    let (negative, magnitude) = parse_integer(type_name, value)?;
    if negative && !magnitude.is_zero() {
        return Err(invalid_value(type_name, value));
    }
    if magnitude.bits() > bits as usize {
        return Err(Eip712Error::InvalidValue {
            type_name: type_name.to_string(),
            value: format!("{} does not fit in {} bits", value, bits),
        });
    }
    Ok(magnitude)
}

/// Encode an `intN` as a sign-extended two's complement word
fn encode_int(type_name: &str, bits: u32, value: &serde_json::Value) -> Result<U256, Eip712Error> {
    let (negative, magnitude) = parse_integer(type_name, value)?;
    let limit = U256::one() << (bits as usize - 1);

    let in_range = if negative {
        magnitude <= limit
    } else {
        magnitude < limit
    };
    if !in_range {
        return Err(Eip712Error::InvalidValue {
            type_name: type_name.to_string(),
            value: format!("{} does not fit in {} bits", value, bits),
        });
    }

    if negative {
        Ok((!magnitude).overflowing_add(U256::one()).0)
    } else {
        Ok(magnitude)
    }
}

/// Parse an integer as (is_negative, magnitude)
///
/// Accepts JSON numbers, decimal strings and `0x` hex strings.
fn parse_integer(
    type_name: &str,
    value: &serde_json::Value,
) -> Result<(bool, U256), Eip712Error> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok((false, U256::from(u)))
            } else if let Some(i) = n.as_i64() {
                Ok((i < 0, U256::from(i.unsigned_abs())))
            } else {
                // Floats and out-of-range literals are not integers
                Err(invalid_value(type_name, value))
            }
        }
        serde_json::Value::String(s) => {
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s.as_str()),
            };
            let magnitude = match digits
                .strip_prefix("0x")
                .or_else(|| digits.strip_prefix("0X"))
            {
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(digits).ok(),
            };
            magnitude
                .map(|m| (negative, m))
                .ok_or_else(|| invalid_value(type_name, value))
        }
        _ => Err(invalid_value(type_name, value)),
    }
}

/// Parse an Ethereum address, enforcing the EIP-55 checksum on mixed case
pub fn parse_address(addr: &str) -> Result<[u8; 20], Eip712Error> {
    let body = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if body.len() != 40 {
        return Err(Eip712Error::InvalidAddress(format!(
            "invalid length: expected 40 hex chars, got {}",
            body.len()
        )));
    }

    let bytes = hex::decode(body)
        .map_err(|e| Eip712Error::InvalidAddress(format!("invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);

    if is_mixed_case(body) {
        let checksummed = to_checksum_address(&result);
        if &checksummed[2..] != body {
            return Err(Eip712Error::InvalidAddress(format!("bad checksum: {}", addr)));
        }
    }

    Ok(result)
}

/// Parse a hex string (with or without 0x prefix)
fn parse_hex(s: &str) -> Result<Vec<u8>, Eip712Error> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    hex::decode(s).map_err(|e| Eip712Error::EncodingError(format!("invalid hex: {}", e)))
}

fn invalid_value(type_name: &str, value: &serde_json::Value) -> Eip712Error {
    Eip712Error::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}
