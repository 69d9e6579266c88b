#[derive(Clone, wealthform::form::FormModel)]
enum RiskProfile {
    Conservative,
}

fn main() {
    let _ = RiskProfile::Conservative;
}
