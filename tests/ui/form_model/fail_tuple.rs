#[derive(Clone, wealthform::form::FormModel)]
struct IbanForm(String);

fn main() {
    let _ = IbanForm(String::new()).0;
}
