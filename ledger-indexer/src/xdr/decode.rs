//! `ReadXdr` implementations for the ledger record model

use super::types::*;
use super::{ReadXdr, XdrReader, UNBOUNDED};
use crate::core::error::DecodeError;

fn unknown(kind: &'static str, value: i32) -> DecodeError {
    DecodeError::UnknownDiscriminant { kind, value }
}

const KEY_TYPE_ED25519: i32 = 0;
const KEY_TYPE_PRE_AUTH_TX: i32 = 1;
const KEY_TYPE_HASH_X: i32 = 2;
const KEY_TYPE_MUXED_ED25519: i32 = 0x100;

const ENVELOPE_TYPE_TX_V0: i32 = 0;
const ENVELOPE_TYPE_TX: i32 = 2;
const ENVELOPE_TYPE_TX_FEE_BUMP: i32 = 5;

impl ReadXdr for AccountId {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            KEY_TYPE_ED25519 => Ok(AccountId(r.read_fixed::<32>()?)),
            value => Err(unknown("PublicKey", value)),
        }
    }
}

impl ReadXdr for MuxedAccount {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            KEY_TYPE_ED25519 => Ok(MuxedAccount {
                ed25519: r.read_fixed::<32>()?,
                id: None,
            }),
            KEY_TYPE_MUXED_ED25519 => {
                let id = r.read_u64()?;
                Ok(MuxedAccount {
                    ed25519: r.read_fixed::<32>()?,
                    id: Some(id),
                })
            }
            value => Err(unknown("MuxedAccount", value)),
        }
    }
}

impl ReadXdr for Asset {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(Asset::Native),
            1 => {
                let code = r.read_fixed::<4>()?;
                Ok(Asset::CreditAlphanum4 {
                    code,
                    issuer: AccountId::read_xdr(r)?,
                })
            }
            2 => {
                let code = r.read_fixed::<12>()?;
                Ok(Asset::CreditAlphanum12 {
                    code,
                    issuer: AccountId::read_xdr(r)?,
                })
            }
            value => Err(unknown("AssetType", value)),
        }
    }
}

impl ReadXdr for AssetCode {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            1 => Ok(AssetCode::Alphanum4(r.read_fixed::<4>()?)),
            2 => Ok(AssetCode::Alphanum12(r.read_fixed::<12>()?)),
            value => Err(unknown("AssetCode", value)),
        }
    }
}

impl ReadXdr for Price {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(Price {
            n: r.read_i32()?,
            d: r.read_i32()?,
        })
    }
}

impl ReadXdr for Memo {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(Memo::None),
            1 => Ok(Memo::Text(r.read_opaque("MemoText", 28)?)),
            2 => Ok(Memo::Id(r.read_u64()?)),
            3 => Ok(Memo::Hash(r.read_fixed::<32>()?)),
            4 => Ok(Memo::Return(r.read_fixed::<32>()?)),
            value => Err(unknown("MemoType", value)),
        }
    }
}

impl ReadXdr for TimeBounds {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(TimeBounds {
            min_time: r.read_u64()?,
            max_time: r.read_u64()?,
        })
    }
}

impl ReadXdr for SignerKey {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            KEY_TYPE_ED25519 => Ok(SignerKey::Ed25519(r.read_fixed::<32>()?)),
            KEY_TYPE_PRE_AUTH_TX => Ok(SignerKey::PreAuthTx(r.read_fixed::<32>()?)),
            KEY_TYPE_HASH_X => Ok(SignerKey::HashX(r.read_fixed::<32>()?)),
            value => Err(unknown("SignerKey", value)),
        }
    }
}

impl ReadXdr for Signer {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(Signer {
            key: SignerKey::read_xdr(r)?,
            weight: r.read_u32()?,
        })
    }
}

/// XDR `string<N>` / `opaque<N>` wrapper used for optional strings
struct Bounded<const MAX: usize>(Vec<u8>);

impl<const MAX: usize> ReadXdr for Bounded<MAX> {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(Bounded(r.read_opaque("string", MAX)?))
    }
}

// ---------------------------------------------------------------------------
// Ledger header

impl ReadXdr for StellarValue {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let tx_set_hash = r.read_fixed::<32>()?;
        let close_time = r.read_u64()?;
        let upgrades = r
            .read_array::<Bounded<128>>("upgrades", 6)?
            .into_iter()
            .map(|u| u.0)
            .collect();
        let signature = match r.read_i32()? {
            0 => None,
            1 => {
                let node = AccountId::read_xdr(r)?;
                Some((node, r.read_opaque("Signature", 64)?))
            }
            value => return Err(unknown("StellarValueType", value)),
        };
        Ok(StellarValue {
            tx_set_hash,
            close_time,
            upgrades,
            signature,
        })
    }
}

impl ReadXdr for LedgerHeader {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let ledger_version = r.read_u32()?;
        let previous_ledger_hash = r.read_fixed::<32>()?;
        let scp_value = StellarValue::read_xdr(r)?;
        let tx_set_result_hash = r.read_fixed::<32>()?;
        let bucket_list_hash = r.read_fixed::<32>()?;
        let ledger_seq = r.read_u32()?;
        let total_coins = r.read_i64()?;
        let fee_pool = r.read_i64()?;
        let inflation_seq = r.read_u32()?;
        let id_pool = r.read_u64()?;
        let base_fee = r.read_u32()?;
        let base_reserve = r.read_u32()?;
        let max_tx_set_size = r.read_u32()?;
        let skip_list = [
            r.read_fixed::<32>()?,
            r.read_fixed::<32>()?,
            r.read_fixed::<32>()?,
            r.read_fixed::<32>()?,
        ];
        let flags = match r.read_i32()? {
            0 => None,
            1 => {
                let flags = r.read_u32()?;
                r.read_empty_ext("LedgerHeaderExtensionV1")?;
                Some(flags)
            }
            value => return Err(unknown("LedgerHeaderExt", value)),
        };
        Ok(LedgerHeader {
            ledger_version,
            previous_ledger_hash,
            scp_value,
            tx_set_result_hash,
            bucket_list_hash,
            ledger_seq,
            total_coins,
            fee_pool,
            inflation_seq,
            id_pool,
            base_fee,
            base_reserve,
            max_tx_set_size,
            skip_list,
            flags,
        })
    }
}

impl ReadXdr for LedgerHeaderHistoryEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let hash = r.read_fixed::<32>()?;
        let header = LedgerHeader::read_xdr(r)?;
        r.read_empty_ext("LedgerHeaderHistoryEntryExt")?;
        Ok(LedgerHeaderHistoryEntry { hash, header })
    }
}

// ---------------------------------------------------------------------------
// Operations

fn read_path(r: &mut XdrReader<'_>) -> Result<Vec<Asset>, DecodeError> {
    r.read_array("path", 5)
}

impl ReadXdr for OperationBody {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let body = match r.read_i32()? {
            0 => OperationBody::CreateAccount(CreateAccountOp {
                destination: AccountId::read_xdr(r)?,
                starting_balance: r.read_i64()?,
            }),
            1 => OperationBody::Payment(PaymentOp {
                destination: MuxedAccount::read_xdr(r)?,
                asset: Asset::read_xdr(r)?,
                amount: r.read_i64()?,
            }),
            2 => OperationBody::PathPaymentStrictReceive(PathPaymentStrictReceiveOp {
                send_asset: Asset::read_xdr(r)?,
                send_max: r.read_i64()?,
                destination: MuxedAccount::read_xdr(r)?,
                dest_asset: Asset::read_xdr(r)?,
                dest_amount: r.read_i64()?,
                path: read_path(r)?,
            }),
            3 => OperationBody::ManageSellOffer(ManageSellOfferOp {
                selling: Asset::read_xdr(r)?,
                buying: Asset::read_xdr(r)?,
                amount: r.read_i64()?,
                price: Price::read_xdr(r)?,
                offer_id: r.read_i64()?,
            }),
            4 => OperationBody::CreatePassiveSellOffer(CreatePassiveSellOfferOp {
                selling: Asset::read_xdr(r)?,
                buying: Asset::read_xdr(r)?,
                amount: r.read_i64()?,
                price: Price::read_xdr(r)?,
            }),
            5 => OperationBody::SetOptions(SetOptionsOp {
                inflation_dest: r.read_optional()?,
                clear_flags: r.read_optional()?,
                set_flags: r.read_optional()?,
                master_weight: r.read_optional()?,
                low_threshold: r.read_optional()?,
                med_threshold: r.read_optional()?,
                high_threshold: r.read_optional()?,
                home_domain: r.read_optional::<Bounded<32>>()?.map(|d| d.0),
                signer: r.read_optional()?,
            }),
            6 => OperationBody::ChangeTrust(ChangeTrustOp {
                line: Asset::read_xdr(r)?,
                limit: r.read_i64()?,
            }),
            7 => OperationBody::AllowTrust(AllowTrustOp {
                trustor: AccountId::read_xdr(r)?,
                asset: AssetCode::read_xdr(r)?,
                authorize: r.read_u32()?,
            }),
            8 => OperationBody::AccountMerge(MuxedAccount::read_xdr(r)?),
            9 => OperationBody::Inflation,
            10 => OperationBody::ManageData(ManageDataOp {
                data_name: r.read_opaque("DataName", 64)?,
                data_value: r.read_optional::<Bounded<64>>()?.map(|v| v.0),
            }),
            11 => OperationBody::BumpSequence(BumpSequenceOp { bump_to: r.read_i64()? }),
            12 => OperationBody::ManageBuyOffer(ManageBuyOfferOp {
                selling: Asset::read_xdr(r)?,
                buying: Asset::read_xdr(r)?,
                buy_amount: r.read_i64()?,
                price: Price::read_xdr(r)?,
                offer_id: r.read_i64()?,
            }),
            13 => OperationBody::PathPaymentStrictSend(PathPaymentStrictSendOp {
                send_asset: Asset::read_xdr(r)?,
                send_amount: r.read_i64()?,
                destination: MuxedAccount::read_xdr(r)?,
                dest_asset: Asset::read_xdr(r)?,
                dest_min: r.read_i64()?,
                path: read_path(r)?,
            }),
            value => return Err(unknown("OperationType", value)),
        };
        Ok(body)
    }
}

impl ReadXdr for Operation {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(Operation {
            source_account: r.read_optional()?,
            body: OperationBody::read_xdr(r)?,
        })
    }
}

/// Fields shared by v0 and v1 transactions after the source account
fn read_transaction_tail(r: &mut XdrReader<'_>, source_account: MuxedAccount) -> Result<Transaction, DecodeError> {
    let fee = r.read_u32()?;
    let seq_num = r.read_i64()?;
    let time_bounds = r.read_optional()?;
    let memo = Memo::read_xdr(r)?;
    let operations = r.read_array("operations", 100)?;
    r.read_empty_ext("TransactionExt")?;
    Ok(Transaction {
        source_account,
        fee,
        seq_num,
        time_bounds,
        memo,
        operations,
    })
}

fn read_transaction_v0(r: &mut XdrReader<'_>) -> Result<Transaction, DecodeError> {
    let source = MuxedAccount {
        ed25519: r.read_fixed::<32>()?,
        id: None,
    };
    read_transaction_tail(r, source)
}

impl ReadXdr for Transaction {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let source = MuxedAccount::read_xdr(r)?;
        read_transaction_tail(r, source)
    }
}

impl ReadXdr for DecoratedSignature {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(DecoratedSignature {
            hint: r.read_fixed::<4>()?,
            signature: r.read_opaque("Signature", 64)?,
        })
    }
}

fn read_signatures(r: &mut XdrReader<'_>) -> Result<Vec<DecoratedSignature>, DecodeError> {
    r.read_array("signatures", 20)
}

/// Envelope kind plus the raw bytes a transaction hash is computed over
pub struct SignaturePayload<'a> {
    pub envelope_type: i32,
    pub tx_bytes: &'a [u8],
}

impl TransactionEnvelope {
    /// Decode an envelope and keep the raw bytes of the signed transaction
    pub fn read_with_payload<'a>(r: &mut XdrReader<'a>) -> Result<(Self, SignaturePayload<'a>), DecodeError> {
        let envelope_type = r.read_i32()?;
        let start = r.position();
        let body = match envelope_type {
            ENVELOPE_TYPE_TX_V0 => EnvelopeBody::V0(read_transaction_v0(r)?),
            ENVELOPE_TYPE_TX => EnvelopeBody::V1(Transaction::read_xdr(r)?),
            ENVELOPE_TYPE_TX_FEE_BUMP => {
                let fee_source = MuxedAccount::read_xdr(r)?;
                let fee = r.read_i64()?;
                let (inner_tx, inner_signatures) = match r.read_i32()? {
                    ENVELOPE_TYPE_TX => (Transaction::read_xdr(r)?, read_signatures(r)?),
                    value => return Err(unknown("FeeBumpInnerTx", value)),
                };
                r.read_empty_ext("FeeBumpTransactionExt")?;
                EnvelopeBody::FeeBump(FeeBumpTransaction {
                    fee_source,
                    fee,
                    inner_tx,
                    inner_signatures,
                })
            }
            value => return Err(unknown("EnvelopeType", value)),
        };
        let payload = SignaturePayload {
            envelope_type,
            tx_bytes: r.consumed_since(start),
        };
        let signatures = read_signatures(r)?;
        let envelope = match body {
            EnvelopeBody::V0(tx) => TransactionEnvelope::TxV0 { tx, signatures },
            EnvelopeBody::V1(tx) => TransactionEnvelope::Tx { tx, signatures },
            EnvelopeBody::FeeBump(tx) => TransactionEnvelope::FeeBump { tx, signatures },
        };
        Ok((envelope, payload))
    }
}

enum EnvelopeBody {
    V0(Transaction),
    V1(Transaction),
    FeeBump(FeeBumpTransaction),
}

impl ReadXdr for TransactionEnvelope {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        TransactionEnvelope::read_with_payload(r).map(|(envelope, _)| envelope)
    }
}

// ---------------------------------------------------------------------------
// Results

impl ReadXdr for ClaimOfferAtom {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(ClaimOfferAtom {
            seller_id: AccountId::read_xdr(r)?,
            offer_id: r.read_i64()?,
            asset_sold: Asset::read_xdr(r)?,
            amount_sold: r.read_i64()?,
            asset_bought: Asset::read_xdr(r)?,
            amount_bought: r.read_i64()?,
        })
    }
}

fn read_path_payment_result(r: &mut XdrReader<'_>) -> Result<PathPaymentResult, DecodeError> {
    match r.read_i32()? {
        0 => {
            let offers = r.read_array("offers", UNBOUNDED)?;
            let last = SimplePaymentResult {
                destination: AccountId::read_xdr(r)?,
                asset: Asset::read_xdr(r)?,
                amount: r.read_i64()?,
            };
            Ok(PathPaymentResult::Success { offers, last })
        }
        PATH_PAYMENT_NO_ISSUER => Ok(PathPaymentResult::NoIssuer(Asset::read_xdr(r)?)),
        code => Ok(PathPaymentResult::Failure(code)),
    }
}

fn read_manage_offer_result(r: &mut XdrReader<'_>) -> Result<ManageOfferResult, DecodeError> {
    match r.read_i32()? {
        0 => {
            let offers_claimed = r.read_array("offersClaimed", UNBOUNDED)?;
            let offer = match r.read_i32()? {
                0 => ManageOfferEffect::Created(OfferEntry::read_xdr(r)?),
                1 => ManageOfferEffect::Updated(OfferEntry::read_xdr(r)?),
                2 => ManageOfferEffect::Deleted,
                value => return Err(unknown("ManageOfferEffect", value)),
            };
            Ok(ManageOfferResult::Success(ManageOfferSuccessResult { offers_claimed, offer }))
        }
        code => Ok(ManageOfferResult::Failure(code)),
    }
}

impl ReadXdr for InflationPayout {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(InflationPayout {
            destination: AccountId::read_xdr(r)?,
            amount: r.read_i64()?,
        })
    }
}

impl ReadXdr for OperationResultTr {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let tr = match r.read_i32()? {
            0 => OperationResultTr::CreateAccount(r.read_i32()?),
            1 => OperationResultTr::Payment(r.read_i32()?),
            2 => OperationResultTr::PathPaymentStrictReceive(read_path_payment_result(r)?),
            3 => OperationResultTr::ManageSellOffer(read_manage_offer_result(r)?),
            4 => OperationResultTr::CreatePassiveSellOffer(read_manage_offer_result(r)?),
            5 => OperationResultTr::SetOptions(r.read_i32()?),
            6 => OperationResultTr::ChangeTrust(r.read_i32()?),
            7 => OperationResultTr::AllowTrust(r.read_i32()?),
            8 => OperationResultTr::AccountMerge(match r.read_i32()? {
                0 => AccountMergeResult::Success(r.read_i64()?),
                code => AccountMergeResult::Failure(code),
            }),
            9 => OperationResultTr::Inflation(match r.read_i32()? {
                0 => InflationResult::Success(r.read_array("payouts", UNBOUNDED)?),
                code => InflationResult::Failure(code),
            }),
            10 => OperationResultTr::ManageData(r.read_i32()?),
            11 => OperationResultTr::BumpSequence(r.read_i32()?),
            12 => OperationResultTr::ManageBuyOffer(read_manage_offer_result(r)?),
            13 => OperationResultTr::PathPaymentStrictSend(read_path_payment_result(r)?),
            value => return Err(unknown("OperationType", value)),
        };
        Ok(tr)
    }
}

impl ReadXdr for OperationResult {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(OperationResult::Inner(OperationResultTr::read_xdr(r)?)),
            -1 => Ok(OperationResult::BadAuth),
            -2 => Ok(OperationResult::NoAccount),
            -3 => Ok(OperationResult::NotSupported),
            -4 => Ok(OperationResult::TooManySubentries),
            -5 => Ok(OperationResult::ExceededWorkLimit),
            -6 => Ok(OperationResult::TooManySponsoring),
            value => Err(unknown("OperationResultCode", value)),
        }
    }
}

fn read_operation_results(r: &mut XdrReader<'_>) -> Result<Vec<OperationResult>, DecodeError> {
    r.read_array("results", UNBOUNDED)
}

impl ReadXdr for InnerTransactionResultPair {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let transaction_hash = r.read_fixed::<32>()?;
        let fee_charged = r.read_i64()?;
        let result = match r.read_i32()? {
            TX_SUCCESS => InnerTransactionResult::Success(read_operation_results(r)?),
            TX_FAILED => InnerTransactionResult::Failed(read_operation_results(r)?),
            TX_FEE_BUMP_INNER_SUCCESS | TX_FEE_BUMP_INNER_FAILED => {
                return Err(DecodeError::Invalid("nested fee bump result".to_string()))
            }
            code => InnerTransactionResult::Other(code),
        };
        r.read_empty_ext("InnerTransactionResultExt")?;
        Ok(InnerTransactionResultPair {
            transaction_hash,
            fee_charged,
            result,
        })
    }
}

impl ReadXdr for TransactionResult {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let fee_charged = r.read_i64()?;
        let result = match r.read_i32()? {
            TX_FEE_BUMP_INNER_SUCCESS => {
                TransactionResultResult::FeeBumpInnerSuccess(InnerTransactionResultPair::read_xdr(r)?)
            }
            TX_FEE_BUMP_INNER_FAILED => {
                TransactionResultResult::FeeBumpInnerFailed(InnerTransactionResultPair::read_xdr(r)?)
            }
            TX_SUCCESS => TransactionResultResult::Success(read_operation_results(r)?),
            TX_FAILED => TransactionResultResult::Failed(read_operation_results(r)?),
            code => TransactionResultResult::Other(code),
        };
        r.read_empty_ext("TransactionResultExt")?;
        Ok(TransactionResult { fee_charged, result })
    }
}

impl ReadXdr for TransactionResultPair {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(TransactionResultPair {
            transaction_hash: r.read_fixed::<32>()?,
            result: TransactionResult::read_xdr(r)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Ledger entries

impl ReadXdr for Liabilities {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(Liabilities {
            buying: r.read_i64()?,
            selling: r.read_i64()?,
        })
    }
}

/// `SponsorshipDescriptor` is an optional account id
struct SponsorshipDescriptor(Option<AccountId>);

impl ReadXdr for SponsorshipDescriptor {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(SponsorshipDescriptor(r.read_optional()?))
    }
}

fn read_account_ext(r: &mut XdrReader<'_>) -> Result<Option<Liabilities>, DecodeError> {
    match r.read_i32()? {
        0 => Ok(None),
        1 => {
            let liabilities = Liabilities::read_xdr(r)?;
            match r.read_i32()? {
                0 => {}
                2 => {
                    // Sponsorship counters are not exported
                    let _num_sponsored = r.read_u32()?;
                    let _num_sponsoring = r.read_u32()?;
                    let _signer_sponsors = r.read_array::<SponsorshipDescriptor>("signerSponsoringIDs", 20)?;
                    r.read_empty_ext("AccountEntryExtensionV2Ext")?;
                }
                value => return Err(unknown("AccountEntryExtensionV1Ext", value)),
            }
            Ok(Some(liabilities))
        }
        value => Err(unknown("AccountEntryExt", value)),
    }
}

impl ReadXdr for AccountEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(AccountEntry {
            account_id: AccountId::read_xdr(r)?,
            balance: r.read_i64()?,
            seq_num: r.read_i64()?,
            num_sub_entries: r.read_u32()?,
            inflation_dest: r.read_optional()?,
            flags: r.read_u32()?,
            home_domain: r.read_opaque("string32", 32)?,
            thresholds: r.read_fixed::<4>()?,
            signers: r.read_array("signers", 20)?,
            liabilities: read_account_ext(r)?,
        })
    }
}

fn read_trustline_ext(r: &mut XdrReader<'_>) -> Result<Option<Liabilities>, DecodeError> {
    match r.read_i32()? {
        0 => Ok(None),
        1 => {
            let liabilities = Liabilities::read_xdr(r)?;
            r.read_empty_ext("TrustLineEntryV1Ext")?;
            Ok(Some(liabilities))
        }
        value => Err(unknown("TrustLineEntryExt", value)),
    }
}

impl ReadXdr for TrustLineEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(TrustLineEntry {
            account_id: AccountId::read_xdr(r)?,
            asset: Asset::read_xdr(r)?,
            balance: r.read_i64()?,
            limit: r.read_i64()?,
            flags: r.read_u32()?,
            liabilities: read_trustline_ext(r)?,
        })
    }
}

impl ReadXdr for OfferEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let entry = OfferEntry {
            seller_id: AccountId::read_xdr(r)?,
            offer_id: r.read_i64()?,
            selling: Asset::read_xdr(r)?,
            buying: Asset::read_xdr(r)?,
            amount: r.read_i64()?,
            price: Price::read_xdr(r)?,
            flags: r.read_u32()?,
        };
        r.read_empty_ext("OfferEntryExt")?;
        Ok(entry)
    }
}

impl ReadXdr for DataEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let entry = DataEntry {
            account_id: AccountId::read_xdr(r)?,
            data_name: r.read_opaque("DataName", 64)?,
            data_value: r.read_opaque("DataValue", 64)?,
        };
        r.read_empty_ext("DataEntryExt")?;
        Ok(entry)
    }
}

impl ReadXdr for LedgerEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        let last_modified_ledger_seq = r.read_u32()?;
        let data = match r.read_i32()? {
            0 => LedgerEntryData::Account(AccountEntry::read_xdr(r)?),
            1 => LedgerEntryData::Trustline(TrustLineEntry::read_xdr(r)?),
            2 => LedgerEntryData::Offer(OfferEntry::read_xdr(r)?),
            3 => LedgerEntryData::Data(DataEntry::read_xdr(r)?),
            value => return Err(unknown("LedgerEntryType", value)),
        };
        let sponsor = match r.read_i32()? {
            0 => None,
            1 => {
                let sponsor = SponsorshipDescriptor::read_xdr(r)?.0;
                r.read_empty_ext("LedgerEntryExtensionV1Ext")?;
                sponsor
            }
            value => return Err(unknown("LedgerEntryExt", value)),
        };
        Ok(LedgerEntry {
            last_modified_ledger_seq,
            data,
            sponsor,
        })
    }
}

impl ReadXdr for LedgerKey {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(LedgerKey::Account {
                account_id: AccountId::read_xdr(r)?,
            }),
            1 => Ok(LedgerKey::Trustline {
                account_id: AccountId::read_xdr(r)?,
                asset: Asset::read_xdr(r)?,
            }),
            2 => Ok(LedgerKey::Offer {
                seller_id: AccountId::read_xdr(r)?,
                offer_id: r.read_i64()?,
            }),
            3 => Ok(LedgerKey::Data {
                account_id: AccountId::read_xdr(r)?,
                data_name: r.read_opaque("DataName", 64)?,
            }),
            value => Err(unknown("LedgerEntryType", value)),
        }
    }
}

impl ReadXdr for LedgerEntryChange {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(LedgerEntryChange::Created(LedgerEntry::read_xdr(r)?)),
            1 => Ok(LedgerEntryChange::Updated(LedgerEntry::read_xdr(r)?)),
            2 => Ok(LedgerEntryChange::Removed(LedgerKey::read_xdr(r)?)),
            3 => Ok(LedgerEntryChange::State(LedgerEntry::read_xdr(r)?)),
            value => Err(unknown("LedgerEntryChangeType", value)),
        }
    }
}

/// `LedgerEntryChanges` as stored in fee history rows
impl ReadXdr for Vec<LedgerEntryChange> {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_array("LedgerEntryChanges", UNBOUNDED)
    }
}

impl ReadXdr for OperationMeta {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(OperationMeta {
            changes: Vec::<LedgerEntryChange>::read_xdr(r)?,
        })
    }
}

impl ReadXdr for TransactionMeta {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        match r.read_i32()? {
            0 => Ok(TransactionMeta::V0(r.read_array("operations", UNBOUNDED)?)),
            1 => Ok(TransactionMeta::V1 {
                tx_changes: Vec::<LedgerEntryChange>::read_xdr(r)?,
                operations: r.read_array("operations", UNBOUNDED)?,
            }),
            2 => Ok(TransactionMeta::V2 {
                tx_changes_before: Vec::<LedgerEntryChange>::read_xdr(r)?,
                operations: r.read_array("operations", UNBOUNDED)?,
                tx_changes_after: Vec::<LedgerEntryChange>::read_xdr(r)?,
            }),
            value => Err(unknown("TransactionMeta", value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger close stream

impl ReadXdr for TransactionResultMeta {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        Ok(TransactionResultMeta {
            result: TransactionResultPair::read_xdr(r)?,
            fee_processing: Vec::<LedgerEntryChange>::read_xdr(r)?,
            tx_apply_processing: TransactionMeta::read_xdr(r)?,
        })
    }
}
