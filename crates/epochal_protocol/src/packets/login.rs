use std::io::{Read, Write};

use uuid::Uuid;

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Packet, PacketKind};
use crate::types::{
    Boolean, ByteArray, Long, ProtocolRead, ProtocolString, ProtocolUuid, ProtocolWrite,
    ShortByteArray, TextComponent, VarInt,
};
use crate::version::ProtocolVersion;

const MAX_USERNAME_LENGTH: usize = 16;
const MAX_SERVER_ID_LENGTH: usize = 20;

/// 1.7 prefixes login byte arrays with an `i16` instead of a VarInt.
fn uses_short_arrays(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_8
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8], ctx: &CodecContext<'_>) -> Result<usize> {
    if uses_short_arrays(ctx.version) {
        if bytes.len() > i16::MAX as usize {
            return Err(ProtocolError::invalid_value("byte array length", bytes.len() as i64));
        }
        ShortByteArray(bytes.to_vec()).write_to(writer)
    } else {
        ByteArray(bytes.to_vec()).write_to(writer)
    }
}

fn read_bytes<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Vec<u8>> {
    if uses_short_arrays(ctx.version) {
        Ok(ShortByteArray::read_from(reader)?.0.0)
    } else {
        Ok(ByteArray::read_from(reader)?.0.0)
    }
}

fn read_option<R: Read, T>(
    reader: &mut R,
    read: impl FnOnce(&mut R) -> Result<T>,
) -> Result<Option<T>> {
    let (Boolean(present), _) = Boolean::read_from(reader)?;
    if present { read(reader).map(Some) } else { Ok(None) }
}

/// Chat signing key sent by 1.19 and 1.19.1 clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPublicKey {
    pub expires_at: i64,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl PlayerPublicKey {
    fn write<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = Long(self.expires_at).write_to(writer)?;
        written += ByteArray(self.public_key.clone()).write_to(writer)?;
        written += ByteArray(self.signature.clone()).write_to(writer)?;
        Ok(written)
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let (Long(expires_at), _) = Long::read_from(reader)?;
        let (ByteArray(public_key), _) = ByteArray::read_from(reader)?;
        let (ByteArray(signature), _) = ByteArray::read_from(reader)?;
        Ok(Self {
            expires_at,
            public_key,
            signature,
        })
    }
}

/// Field layout of Login Start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStartLayout {
    NameOnly,
    /// 1.19: optional signing key.
    SignedKey,
    /// 1.19.1: optional signing key, then optional UUID.
    SignedKeyAndUuid,
    /// 1.19.3 to 1.20.1: optional UUID.
    OptionalUuid,
    /// 1.20.2 onwards: mandatory UUID.
    Uuid,
}

impl LoginStartLayout {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_19 {
            LoginStartLayout::NameOnly
        } else if version < ProtocolVersion::V1_19_1 {
            LoginStartLayout::SignedKey
        } else if version < ProtocolVersion::V1_19_3 {
            LoginStartLayout::SignedKeyAndUuid
        } else if version < ProtocolVersion::V1_20_2 {
            LoginStartLayout::OptionalUuid
        } else {
            LoginStartLayout::Uuid
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerBoundLoginStart {
    pub name: String,
    pub public_key: Option<PlayerPublicKey>,
    pub uuid: Option<Uuid>,
}

impl ServerBoundLoginStart {
    pub fn new(name: impl Into<String>, uuid: Option<Uuid>) -> Self {
        Self {
            name: name.into(),
            public_key: None,
            uuid,
        }
    }
}

impl Packet for ServerBoundLoginStart {
    const KIND: PacketKind = PacketKind::LoginStart;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = ProtocolString::write_str(writer, &self.name, MAX_USERNAME_LENGTH)?;

        let layout = LoginStartLayout::for_version(ctx.version);
        if matches!(
            layout,
            LoginStartLayout::SignedKey | LoginStartLayout::SignedKeyAndUuid
        ) {
            written += Boolean(self.public_key.is_some()).write_to(writer)?;
            if let Some(key) = &self.public_key {
                written += key.write(writer)?;
            }
        }
        match layout {
            LoginStartLayout::NameOnly | LoginStartLayout::SignedKey => {}
            LoginStartLayout::SignedKeyAndUuid | LoginStartLayout::OptionalUuid => {
                written += Boolean(self.uuid.is_some()).write_to(writer)?;
                if let Some(uuid) = self.uuid {
                    written += ProtocolUuid(uuid).write_to(writer)?;
                }
            }
            LoginStartLayout::Uuid => {
                let uuid = self.uuid.ok_or(ProtocolError::IncompatibleLayout {
                    kind: Self::KIND,
                    version: ctx.version,
                })?;
                written += ProtocolUuid(uuid).write_to(writer)?;
            }
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (name, _) = ctx.read_string_max(reader, MAX_USERNAME_LENGTH)?;
        let layout = LoginStartLayout::for_version(ctx.version);

        let public_key = match layout {
            LoginStartLayout::SignedKey | LoginStartLayout::SignedKeyAndUuid => {
                read_option(reader, PlayerPublicKey::read)?
            }
            _ => None,
        };
        let uuid = match layout {
            LoginStartLayout::NameOnly | LoginStartLayout::SignedKey => None,
            LoginStartLayout::SignedKeyAndUuid | LoginStartLayout::OptionalUuid => {
                read_option(reader, |r| Ok(ProtocolUuid::read_from(r)?.0.0))?
            }
            LoginStartLayout::Uuid => Some(ProtocolUuid::read_from(reader)?.0.0),
        };

        Ok(Self {
            name,
            public_key,
            uuid,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundEncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
    /// Sent from 1.20.5; older clients always authenticate.
    pub should_authenticate: bool,
}

fn has_should_authenticate(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_20_5
}

impl Packet for ClientBoundEncryptionRequest {
    const KIND: PacketKind = PacketKind::EncryptionRequest;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written =
            ProtocolString::write_str(writer, &self.server_id, MAX_SERVER_ID_LENGTH)?;
        written += write_bytes(writer, &self.public_key, ctx)?;
        written += write_bytes(writer, &self.verify_token, ctx)?;
        if has_should_authenticate(ctx.version) {
            written += Boolean(self.should_authenticate).write_to(writer)?;
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (server_id, _) = ctx.read_string_max(reader, MAX_SERVER_ID_LENGTH)?;
        let public_key = read_bytes(reader, ctx)?;
        let verify_token = read_bytes(reader, ctx)?;
        let should_authenticate = if has_should_authenticate(ctx.version) {
            Boolean::read_from(reader)?.0.0
        } else {
            true
        };
        Ok(Self {
            server_id,
            public_key,
            verify_token,
            should_authenticate,
        })
    }
}

/// Proof of the verify token in Encryption Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionVerification {
    /// Encrypted verify token.
    Token(Vec<u8>),
    /// Salted signature, only 1.19 and 1.19.1 clients holding a signing key send this.
    Salted { salt: i64, signature: Vec<u8> },
}

/// 1.19 and 1.19.1 prefix the verification with a "has token" flag.
fn has_verification_choice(version: ProtocolVersion) -> bool {
    (ProtocolVersion::V1_19..ProtocolVersion::V1_19_3).contains(&version)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerBoundEncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verification: EncryptionVerification,
}

impl Packet for ServerBoundEncryptionResponse {
    const KIND: PacketKind = PacketKind::EncryptionResponse;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = write_bytes(writer, &self.shared_secret, ctx)?;
        let choice = has_verification_choice(ctx.version);
        match &self.verification {
            EncryptionVerification::Token(token) => {
                if choice {
                    written += Boolean(true).write_to(writer)?;
                }
                written += write_bytes(writer, token, ctx)?;
            }
            EncryptionVerification::Salted { salt, signature } if choice => {
                written += Boolean(false).write_to(writer)?;
                written += Long(*salt).write_to(writer)?;
                written += ByteArray(signature.clone()).write_to(writer)?;
            }
            EncryptionVerification::Salted { .. } => {
                return Err(ProtocolError::IncompatibleLayout {
                    kind: Self::KIND,
                    version: ctx.version,
                });
            }
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let shared_secret = read_bytes(reader, ctx)?;
        let has_token = if has_verification_choice(ctx.version) {
            Boolean::read_from(reader)?.0.0
        } else {
            true
        };
        let verification = if has_token {
            EncryptionVerification::Token(read_bytes(reader, ctx)?)
        } else {
            let (Long(salt), _) = Long::read_from(reader)?;
            let (ByteArray(signature), _) = ByteArray::read_from(reader)?;
            EncryptionVerification::Salted { salt, signature }
        };
        Ok(Self {
            shared_secret,
            verification,
        })
    }
}

/// Game profile property, usually the skin texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

impl Property {
    fn write<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = 0;
        written += ctx.write_string(writer, &self.name)?;
        written += ctx.write_string(writer, &self.value)?;
        written += Boolean(self.signature.is_some()).write_to(writer)?;
        if let Some(signature) = &self.signature {
            written += ctx.write_string(writer, signature)?;
        }
        Ok(written)
    }

    fn read<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (name, _) = ctx.read_string(reader)?;
        let (value, _) = ctx.read_string(reader)?;
        let signature = read_option(reader, |r| Ok(ctx.read_string(r)?.0))?;
        Ok(Self {
            name,
            value,
            signature,
        })
    }
}

/// Encoding of the player UUID in Login Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginUuidEncoding {
    /// 32 hex digits, 1.7.2 only.
    SimpleText,
    /// Hyphenated string, 1.7.6 to 1.15.2.
    HyphenatedText,
    /// Two 64-bit words, 1.16 onwards.
    Binary,
}

impl LoginUuidEncoding {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_7_6 {
            LoginUuidEncoding::SimpleText
        } else if version < ProtocolVersion::V1_16 {
            LoginUuidEncoding::HyphenatedText
        } else {
            LoginUuidEncoding::Binary
        }
    }
}

fn has_profile_properties(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_19
}

fn has_strict_error_handling(version: ProtocolVersion) -> bool {
    (ProtocolVersion::V1_20_5..ProtocolVersion::V1_21_2).contains(&version)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundLoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    pub properties: Vec<Property>,
    pub strict_error_handling: bool,
}

impl ClientBoundLoginSuccess {
    pub fn new(uuid: Uuid, username: impl Into<String>) -> Self {
        Self {
            uuid,
            username: username.into(),
            properties: Vec::new(),
            strict_error_handling: false,
        }
    }
}

impl Packet for ClientBoundLoginSuccess {
    const KIND: PacketKind = PacketKind::LoginSuccess;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let uuid = ProtocolUuid(self.uuid);
        let mut written = match LoginUuidEncoding::for_version(ctx.version) {
            LoginUuidEncoding::SimpleText => uuid.write_text(writer, false)?,
            LoginUuidEncoding::HyphenatedText => uuid.write_text(writer, true)?,
            LoginUuidEncoding::Binary => uuid.write_to(writer)?,
        };
        written += ProtocolString::write_str(writer, &self.username, MAX_USERNAME_LENGTH)?;

        if has_profile_properties(ctx.version) {
            written += VarInt(self.properties.len() as i32).write_to(writer)?;
            for property in &self.properties {
                written += property.write(writer, ctx)?;
            }
        }
        if has_strict_error_handling(ctx.version) {
            written += Boolean(self.strict_error_handling).write_to(writer)?;
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (ProtocolUuid(uuid), _) = match LoginUuidEncoding::for_version(ctx.version) {
            LoginUuidEncoding::SimpleText | LoginUuidEncoding::HyphenatedText => {
                ProtocolUuid::read_text(reader)?
            }
            LoginUuidEncoding::Binary => ProtocolUuid::read_from(reader)?,
        };
        let (username, _) = ctx.read_string_max(reader, MAX_USERNAME_LENGTH)?;

        let mut properties = Vec::new();
        if has_profile_properties(ctx.version) {
            let (VarInt(count), _) = VarInt::read_from(reader)?;
            if count < 0 {
                return Err(ProtocolError::NegativeLength(count.into()));
            }
            for _ in 0..count {
                properties.push(Property::read(reader, ctx)?);
            }
        }
        let strict_error_handling = if has_strict_error_handling(ctx.version) {
            Boolean::read_from(reader)?.0.0
        } else {
            false
        };

        Ok(Self {
            uuid,
            username,
            properties,
            strict_error_handling,
        })
    }
}

/// Enables compression for every frame after this one. Exists from 1.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientBoundSetCompression {
    pub threshold: i32,
}

impl ClientBoundSetCompression {
    /// Threshold in bytes, `None` when the value disables compression.
    pub fn threshold(&self) -> Option<usize> {
        usize::try_from(self.threshold).ok()
    }
}

impl Packet for ClientBoundSetCompression {
    const KIND: PacketKind = PacketKind::SetCompression;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        VarInt(self.threshold).write_to(writer)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (VarInt(threshold), _) = VarInt::read_from(reader)?;
        Ok(Self { threshold })
    }
}

/// Login-phase kick; the reason is JSON text on every version.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundLoginDisconnect {
    pub reason: TextComponent,
}

impl Packet for ClientBoundLoginDisconnect {
    const KIND: PacketKind = PacketKind::LoginDisconnect;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        self.reason.write_json(writer)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (reason, _) = TextComponent::read_json(reader)?;
        Ok(Self { reason })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerBoundLoginAcknowledged;

impl Packet for ServerBoundLoginAcknowledged {
    const KIND: PacketKind = PacketKind::LoginAcknowledged;

    fn encode<W: Write>(&self, _writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        Ok(0)
    }

    fn decode<R: Read>(_reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(Self)
    }
}
