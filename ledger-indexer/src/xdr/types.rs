//! Ledger record model
//!
//! A closed Rust rendition of the subset of the ledger XDR schema the
//! exporter consumes. Every union is an enum so handlers match exhaustively.

use std::fmt;

pub type Hash = [u8; 32];

/// Amounts are fixed point with seven decimal places
pub const AMOUNT_SCALE: u32 = 7;

/// Ed25519 account id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub [u8; 32]);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", stellar_strkey::ed25519::PublicKey(self.0).to_string())
    }
}

/// Account reference that may carry a multiplexing id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxedAccount {
    pub ed25519: [u8; 32],
    pub id: Option<u64>,
}

impl MuxedAccount {
    pub fn account_id(&self) -> AccountId {
        AccountId(self.ed25519)
    }
}

impl From<AccountId> for MuxedAccount {
    fn from(account: AccountId) -> Self {
        Self {
            ed25519: account.0,
            id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    CreditAlphanum4 { code: [u8; 4], issuer: AccountId },
    CreditAlphanum12 { code: [u8; 12], issuer: AccountId },
}

impl Asset {
    /// Asset code with trailing zero bytes stripped, `native` for lumens
    pub fn code(&self) -> String {
        match self {
            Asset::Native => "native".to_string(),
            Asset::CreditAlphanum4 { code, .. } => asset_code_string(code),
            Asset::CreditAlphanum12 { code, .. } => asset_code_string(code),
        }
    }

    pub fn issuer(&self) -> Option<AccountId> {
        match self {
            Asset::Native => None,
            Asset::CreditAlphanum4 { issuer, .. } | Asset::CreditAlphanum12 { issuer, .. } => Some(*issuer),
        }
    }
}

pub(crate) fn asset_code_string(code: &[u8]) -> String {
    let end = code.iter().position(|b| *b == 0).unwrap_or(code.len());
    String::from_utf8_lossy(&code[..end]).into_owned()
}

/// Asset code without issuer, as used by allow-trust
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetCode {
    Alphanum4([u8; 4]),
    Alphanum12([u8; 12]),
}

impl fmt::Display for AssetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetCode::Alphanum4(code) => f.write_str(&asset_code_string(code)),
            AssetCode::Alphanum12(code) => f.write_str(&asset_code_string(code)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub fn as_f64(&self) -> f64 {
        if self.d == 0 {
            return 0.0;
        }
        f64::from(self.n) / f64::from(self.d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Memo {
    None,
    Text(Vec<u8>),
    Id(u64),
    Hash(Hash),
    Return(Hash),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKey {
    Ed25519([u8; 32]),
    PreAuthTx([u8; 32]),
    HashX([u8; 32]),
}

impl SignerKey {
    pub fn type_name(&self) -> &'static str {
        match self {
            SignerKey::Ed25519(_) => "ed25519",
            SignerKey::PreAuthTx(_) => "pre_auth_tx",
            SignerKey::HashX(_) => "hash_x",
        }
    }
}

impl fmt::Display for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = match self {
            SignerKey::Ed25519(key) => stellar_strkey::ed25519::PublicKey(*key).to_string(),
            SignerKey::PreAuthTx(hash) => stellar_strkey::PreAuthTx(*hash).to_string(),
            SignerKey::HashX(hash) => stellar_strkey::HashX(*hash).to_string(),
        };
        f.write_str(&encoded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signer {
    pub key: SignerKey,
    pub weight: u32,
}

// ---------------------------------------------------------------------------
// Ledger header

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StellarValue {
    pub tx_set_hash: Hash,
    pub close_time: u64,
    pub upgrades: Vec<Vec<u8>>,
    /// Node id and signature of a signed close value
    pub signature: Option<(AccountId, Vec<u8>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerHeader {
    pub ledger_version: u32,
    pub previous_ledger_hash: Hash,
    pub scp_value: StellarValue,
    pub tx_set_result_hash: Hash,
    pub bucket_list_hash: Hash,
    pub ledger_seq: u32,
    pub total_coins: i64,
    pub fee_pool: i64,
    pub inflation_seq: u32,
    pub id_pool: u64,
    pub base_fee: u32,
    pub base_reserve: u32,
    pub max_tx_set_size: u32,
    pub skip_list: [Hash; 4],
    pub flags: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerHeaderHistoryEntry {
    pub hash: Hash,
    pub header: LedgerHeader,
}

// ---------------------------------------------------------------------------
// Transactions and operations

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountOp {
    pub destination: AccountId,
    pub starting_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOp {
    pub destination: MuxedAccount,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPaymentStrictReceiveOp {
    pub send_asset: Asset,
    pub send_max: i64,
    pub destination: MuxedAccount,
    pub dest_asset: Asset,
    pub dest_amount: i64,
    pub path: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPaymentStrictSendOp {
    pub send_asset: Asset,
    pub send_amount: i64,
    pub destination: MuxedAccount,
    pub dest_asset: Asset,
    pub dest_min: i64,
    pub path: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageSellOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageBuyOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub buy_amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePassiveSellOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptionsOp {
    pub inflation_dest: Option<AccountId>,
    pub clear_flags: Option<u32>,
    pub set_flags: Option<u32>,
    pub master_weight: Option<u32>,
    pub low_threshold: Option<u32>,
    pub med_threshold: Option<u32>,
    pub high_threshold: Option<u32>,
    pub home_domain: Option<Vec<u8>>,
    pub signer: Option<Signer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTrustOp {
    pub line: Asset,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowTrustOp {
    pub trustor: AccountId,
    pub asset: AssetCode,
    pub authorize: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageDataOp {
    pub data_name: Vec<u8>,
    pub data_value: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpSequenceOp {
    pub bump_to: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    CreateAccount,
    Payment,
    PathPaymentStrictReceive,
    ManageSellOffer,
    CreatePassiveSellOffer,
    SetOptions,
    ChangeTrust,
    AllowTrust,
    AccountMerge,
    Inflation,
    ManageData,
    BumpSequence,
    ManageBuyOffer,
    PathPaymentStrictSend,
}

impl OperationType {
    /// Human readable type tag used in operation documents
    pub fn name(&self) -> &'static str {
        match self {
            OperationType::CreateAccount => "create_account",
            OperationType::Payment => "payment",
            OperationType::PathPaymentStrictReceive => "path_payment_strict_receive",
            OperationType::ManageSellOffer => "manage_sell_offer",
            OperationType::CreatePassiveSellOffer => "create_passive_sell_offer",
            OperationType::SetOptions => "set_options",
            OperationType::ChangeTrust => "change_trust",
            OperationType::AllowTrust => "allow_trust",
            OperationType::AccountMerge => "account_merge",
            OperationType::Inflation => "inflation",
            OperationType::ManageData => "manage_data",
            OperationType::BumpSequence => "bump_sequence",
            OperationType::ManageBuyOffer => "manage_buy_offer",
            OperationType::PathPaymentStrictSend => "path_payment_strict_send",
        }
    }

    /// Whether a successful operation of this kind can cross offers
    pub fn claims_offers(&self) -> bool {
        matches!(
            self,
            OperationType::PathPaymentStrictReceive
                | OperationType::PathPaymentStrictSend
                | OperationType::ManageSellOffer
                | OperationType::CreatePassiveSellOffer
                | OperationType::ManageBuyOffer
        )
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    CreateAccount(CreateAccountOp),
    Payment(PaymentOp),
    PathPaymentStrictReceive(PathPaymentStrictReceiveOp),
    ManageSellOffer(ManageSellOfferOp),
    CreatePassiveSellOffer(CreatePassiveSellOfferOp),
    SetOptions(SetOptionsOp),
    ChangeTrust(ChangeTrustOp),
    AllowTrust(AllowTrustOp),
    AccountMerge(MuxedAccount),
    Inflation,
    ManageData(ManageDataOp),
    BumpSequence(BumpSequenceOp),
    ManageBuyOffer(ManageBuyOfferOp),
    PathPaymentStrictSend(PathPaymentStrictSendOp),
}

impl OperationBody {
    pub fn kind(&self) -> OperationType {
        match self {
            OperationBody::CreateAccount(_) => OperationType::CreateAccount,
            OperationBody::Payment(_) => OperationType::Payment,
            OperationBody::PathPaymentStrictReceive(_) => OperationType::PathPaymentStrictReceive,
            OperationBody::ManageSellOffer(_) => OperationType::ManageSellOffer,
            OperationBody::CreatePassiveSellOffer(_) => OperationType::CreatePassiveSellOffer,
            OperationBody::SetOptions(_) => OperationType::SetOptions,
            OperationBody::ChangeTrust(_) => OperationType::ChangeTrust,
            OperationBody::AllowTrust(_) => OperationType::AllowTrust,
            OperationBody::AccountMerge(_) => OperationType::AccountMerge,
            OperationBody::Inflation => OperationType::Inflation,
            OperationBody::ManageData(_) => OperationType::ManageData,
            OperationBody::BumpSequence(_) => OperationType::BumpSequence,
            OperationBody::ManageBuyOffer(_) => OperationType::ManageBuyOffer,
            OperationBody::PathPaymentStrictSend(_) => OperationType::PathPaymentStrictSend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source_account: Option<MuxedAccount>,
    pub body: OperationBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_account: MuxedAccount,
    pub fee: u32,
    pub seq_num: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBumpTransaction {
    pub fee_source: MuxedAccount,
    pub fee: i64,
    pub inner_tx: Transaction,
    pub inner_signatures: Vec<DecoratedSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEnvelope {
    /// Legacy envelope; the source account is a bare ed25519 key
    TxV0 {
        tx: Transaction,
        signatures: Vec<DecoratedSignature>,
    },
    Tx {
        tx: Transaction,
        signatures: Vec<DecoratedSignature>,
    },
    FeeBump {
        tx: FeeBumpTransaction,
        signatures: Vec<DecoratedSignature>,
    },
}

impl TransactionEnvelope {
    /// The transaction whose operations are applied
    pub fn tx(&self) -> &Transaction {
        match self {
            TransactionEnvelope::TxV0 { tx, .. } | TransactionEnvelope::Tx { tx, .. } => tx,
            TransactionEnvelope::FeeBump { tx, .. } => &tx.inner_tx,
        }
    }

    pub fn source_account(&self) -> AccountId {
        self.tx().source_account.account_id()
    }

    /// Account paying the fee (differs from the source for fee bumps)
    pub fn fee_account(&self) -> AccountId {
        match self {
            TransactionEnvelope::FeeBump { tx, .. } => tx.fee_source.account_id(),
            _ => self.source_account(),
        }
    }

    pub fn max_fee(&self) -> i64 {
        match self {
            TransactionEnvelope::FeeBump { tx, .. } => tx.fee,
            _ => i64::from(self.tx().fee),
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.tx().operations
    }

    pub fn is_fee_bump(&self) -> bool {
        matches!(self, TransactionEnvelope::FeeBump { .. })
    }
}

// ---------------------------------------------------------------------------
// Results

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOfferAtom {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub asset_sold: Asset,
    pub amount_sold: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePaymentResult {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPaymentResult {
    Success {
        offers: Vec<ClaimOfferAtom>,
        last: SimplePaymentResult,
    },
    NoIssuer(Asset),
    Failure(i32),
}

pub const PATH_PAYMENT_NO_ISSUER: i32 = -9;

impl PathPaymentResult {
    pub fn code(&self) -> i32 {
        match self {
            PathPaymentResult::Success { .. } => 0,
            PathPaymentResult::NoIssuer(_) => PATH_PAYMENT_NO_ISSUER,
            PathPaymentResult::Failure(code) => *code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageOfferEffect {
    Created(OfferEntry),
    Updated(OfferEntry),
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageOfferSuccessResult {
    pub offers_claimed: Vec<ClaimOfferAtom>,
    pub offer: ManageOfferEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageOfferResult {
    Success(ManageOfferSuccessResult),
    Failure(i32),
}

impl ManageOfferResult {
    pub fn code(&self) -> i32 {
        match self {
            ManageOfferResult::Success(_) => 0,
            ManageOfferResult::Failure(code) => *code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountMergeResult {
    /// Balance of the merged source account
    Success(i64),
    Failure(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflationPayout {
    pub destination: AccountId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InflationResult {
    Success(Vec<InflationPayout>),
    Failure(i32),
}

/// Per-kind operation result; kinds without payloads carry their code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResultTr {
    CreateAccount(i32),
    Payment(i32),
    PathPaymentStrictReceive(PathPaymentResult),
    ManageSellOffer(ManageOfferResult),
    CreatePassiveSellOffer(ManageOfferResult),
    SetOptions(i32),
    ChangeTrust(i32),
    AllowTrust(i32),
    AccountMerge(AccountMergeResult),
    Inflation(InflationResult),
    ManageData(i32),
    BumpSequence(i32),
    ManageBuyOffer(ManageOfferResult),
    PathPaymentStrictSend(PathPaymentResult),
}

impl OperationResultTr {
    /// Kind specific result code, 0 on success
    pub fn code(&self) -> i32 {
        match self {
            OperationResultTr::CreateAccount(code)
            | OperationResultTr::Payment(code)
            | OperationResultTr::SetOptions(code)
            | OperationResultTr::ChangeTrust(code)
            | OperationResultTr::AllowTrust(code)
            | OperationResultTr::ManageData(code)
            | OperationResultTr::BumpSequence(code) => *code,
            OperationResultTr::PathPaymentStrictReceive(r) | OperationResultTr::PathPaymentStrictSend(r) => r.code(),
            OperationResultTr::ManageSellOffer(r)
            | OperationResultTr::CreatePassiveSellOffer(r)
            | OperationResultTr::ManageBuyOffer(r) => r.code(),
            OperationResultTr::AccountMerge(AccountMergeResult::Success(_)) => 0,
            OperationResultTr::AccountMerge(AccountMergeResult::Failure(code)) => *code,
            OperationResultTr::Inflation(InflationResult::Success(_)) => 0,
            OperationResultTr::Inflation(InflationResult::Failure(code)) => *code,
        }
    }

    /// Offers crossed by a successful operation
    pub fn offers_claimed(&self) -> &[ClaimOfferAtom] {
        match self {
            OperationResultTr::PathPaymentStrictReceive(PathPaymentResult::Success { offers, .. })
            | OperationResultTr::PathPaymentStrictSend(PathPaymentResult::Success { offers, .. }) => offers,
            OperationResultTr::ManageSellOffer(ManageOfferResult::Success(success))
            | OperationResultTr::CreatePassiveSellOffer(ManageOfferResult::Success(success))
            | OperationResultTr::ManageBuyOffer(ManageOfferResult::Success(success)) => &success.offers_claimed,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Inner(OperationResultTr),
    BadAuth,
    NoAccount,
    NotSupported,
    TooManySubentries,
    ExceededWorkLimit,
    TooManySponsoring,
}

impl OperationResult {
    /// Outer result code (`opINNER` is 0)
    pub fn code(&self) -> i32 {
        match self {
            OperationResult::Inner(_) => 0,
            OperationResult::BadAuth => -1,
            OperationResult::NoAccount => -2,
            OperationResult::NotSupported => -3,
            OperationResult::TooManySubentries => -4,
            OperationResult::ExceededWorkLimit => -5,
            OperationResult::TooManySponsoring => -6,
        }
    }

    pub fn inner(&self) -> Option<&OperationResultTr> {
        match self {
            OperationResult::Inner(tr) => Some(tr),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.inner().map(|tr| tr.code() == 0).unwrap_or(false)
    }
}

pub const TX_SUCCESS: i32 = 0;
pub const TX_FAILED: i32 = -1;
pub const TX_FEE_BUMP_INNER_SUCCESS: i32 = 1;
pub const TX_FEE_BUMP_INNER_FAILED: i32 = -13;

/// Result of an inner (fee bumped) transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerTransactionResult {
    Success(Vec<OperationResult>),
    Failed(Vec<OperationResult>),
    Other(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerTransactionResultPair {
    pub transaction_hash: Hash,
    pub fee_charged: i64,
    pub result: InnerTransactionResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResultResult {
    FeeBumpInnerSuccess(InnerTransactionResultPair),
    FeeBumpInnerFailed(InnerTransactionResultPair),
    Success(Vec<OperationResult>),
    Failed(Vec<OperationResult>),
    Other(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub fee_charged: i64,
    pub result: TransactionResultResult,
}

impl TransactionResult {
    pub fn code(&self) -> i32 {
        match &self.result {
            TransactionResultResult::FeeBumpInnerSuccess(_) => TX_FEE_BUMP_INNER_SUCCESS,
            TransactionResultResult::FeeBumpInnerFailed(_) => TX_FEE_BUMP_INNER_FAILED,
            TransactionResultResult::Success(_) => TX_SUCCESS,
            TransactionResultResult::Failed(_) => TX_FAILED,
            TransactionResultResult::Other(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.result,
            TransactionResultResult::Success(_) | TransactionResultResult::FeeBumpInnerSuccess(_)
        )
    }

    /// Operation results of the applied transaction, inner one for fee bumps
    pub fn operation_results(&self) -> &[OperationResult] {
        match &self.result {
            TransactionResultResult::Success(results) | TransactionResultResult::Failed(results) => results,
            TransactionResultResult::FeeBumpInnerSuccess(inner)
            | TransactionResultResult::FeeBumpInnerFailed(inner) => match &inner.result {
                InnerTransactionResult::Success(results) | InnerTransactionResult::Failed(results) => results,
                InnerTransactionResult::Other(_) => &[],
            },
            TransactionResultResult::Other(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResultPair {
    pub transaction_hash: Hash,
    pub result: TransactionResult,
}

// ---------------------------------------------------------------------------
// Ledger entries and change logs

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Liabilities {
    pub buying: i64,
    pub selling: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    pub account_id: AccountId,
    pub balance: i64,
    pub seq_num: i64,
    pub num_sub_entries: u32,
    pub inflation_dest: Option<AccountId>,
    pub flags: u32,
    pub home_domain: Vec<u8>,
    pub thresholds: [u8; 4],
    pub signers: Vec<Signer>,
    pub liabilities: Option<Liabilities>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLineEntry {
    pub account_id: AccountId,
    pub asset: Asset,
    pub balance: i64,
    pub limit: i64,
    pub flags: u32,
    pub liabilities: Option<Liabilities>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferEntry {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub account_id: AccountId,
    pub data_name: Vec<u8>,
    pub data_value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntryData {
    Account(AccountEntry),
    Trustline(TrustLineEntry),
    Offer(OfferEntry),
    Data(DataEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub last_modified_ledger_seq: u32,
    pub data: LedgerEntryData,
    pub sponsor: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerKey {
    Account { account_id: AccountId },
    Trustline { account_id: AccountId, asset: Asset },
    Offer { seller_id: AccountId, offer_id: i64 },
    Data { account_id: AccountId, data_name: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntryChange {
    Created(LedgerEntry),
    Updated(LedgerEntry),
    Removed(LedgerKey),
    State(LedgerEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationMeta {
    pub changes: Vec<LedgerEntryChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionMeta {
    V0(Vec<OperationMeta>),
    V1 {
        tx_changes: Vec<LedgerEntryChange>,
        operations: Vec<OperationMeta>,
    },
    V2 {
        tx_changes_before: Vec<LedgerEntryChange>,
        operations: Vec<OperationMeta>,
        tx_changes_after: Vec<LedgerEntryChange>,
    },
}

impl TransactionMeta {
    pub fn operations(&self) -> &[OperationMeta] {
        match self {
            TransactionMeta::V0(operations)
            | TransactionMeta::V1 { operations, .. }
            | TransactionMeta::V2 { operations, .. } => operations,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger close stream

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSet {
    pub previous_ledger_hash: Hash,
    pub txs: Vec<TransactionEnvelope>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResultMeta {
    pub result: TransactionResultPair,
    pub fee_processing: Vec<LedgerEntryChange>,
    pub tx_apply_processing: TransactionMeta,
}
