use rust_decimal::Decimal;
use wealthform::form::{FieldValue, FormModel, ValueKind};

#[derive(Clone, wealthform::form::FormModel)]
struct TransferForm {
    account: String,
    amount: Decimal,
    confirmed: bool,
}

fn main() {
    let fields = TransferForm::fields();
    assert_eq!(fields.account().as_str(), "account");

    let specs = TransferForm::field_specs();
    assert_eq!(specs.len(), 3);
    assert_eq!(specs[1].kind(), ValueKind::Number);

    let values = TransferForm {
        account: "CH93 0076 2011 6238 5295 7".to_string(),
        amount: Decimal::from(250),
        confirmed: true,
    }
    .into_values();
    assert_eq!(
        values.get(&fields.amount()),
        Some(&FieldValue::Number(Decimal::from(250)))
    );

    let decoded = TransferForm::from_values(&values).expect("values decode");
    assert!(decoded.confirmed);
    assert_eq!(decoded.account, "CH93 0076 2011 6238 5295 7");
}
