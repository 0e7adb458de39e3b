//! Renders the debit-order authorization document for a mandate.

use crate::domain::Mandate;

/// Produces a self-contained HTML document with the mandate's reference,
/// bank details, schedule and terms, suitable for download or print.
pub fn render(mandate: &Mandate) -> String {
    let end_date_row = mandate
        .end_date
        .map(|end| {
            format!(
                r#"        <div class="field"><label>End Date:</label><span>{}</span></div>
"#,
                end
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Debit Order Mandate {reference}</title>
  <style>
    body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
    .header {{ text-align: center; margin-bottom: 30px; border-bottom: 2px solid #333; padding-bottom: 20px; }}
    .section {{ margin: 20px 0; }}
    .field {{ margin: 10px 0; }}
    .field label {{ display: inline-block; font-weight: bold; min-width: 200px; }}
    .terms {{ font-size: 12px; line-height: 1.4; margin: 20px 0; }}
    .signature-box {{ border: 1px solid #333; height: 100px; margin: 10px 0; }}
  </style>
</head>
<body>
  <div class="header">
    <h1>DEBIT ORDER MANDATE</h1>
    <p><strong>Mandate Reference:</strong> {reference}</p>
  </div>

  <div class="section">
    <h3>Bank Account Details</h3>
    <div class="field"><label>Bank Name:</label><span>{bank_name}</span></div>
    <div class="field"><label>Branch Code:</label><span>{branch_code}</span></div>
    <div class="field"><label>Account Holder Name:</label><span>{account_holder}</span></div>
    <div class="field"><label>Account Number:</label><span>{account_number}</span></div>
    <div class="field"><label>Account Type:</label><span>{account_type}</span></div>
    <div class="field"><label>Maximum Debit Amount:</label><span>R {max_amount}</span></div>
  </div>

  <div class="section">
    <h3>Debit Order Details</h3>
    <div class="field"><label>Frequency:</label><span>{frequency}</span></div>
    <div class="field"><label>Start Date:</label><span>{start_date}</span></div>
{end_date_row}  </div>

  <div class="terms">
    <h4>Terms and Conditions</h4>
    <p>1. I/We authorize the above organization to debit my/our account as specified.</p>
    <p>2. The maximum amount that may be debited per transaction is R {max_amount}.</p>
    <p>3. I/We understand that this mandate will remain in effect until cancelled by me/us in writing.</p>
    <p>4. Debits will occur on the {frequency} basis starting from {start_date}.</p>
    <p>5. I/We understand that failed debits may incur bank charges.</p>
    <p>6. This mandate complies with the South African banking regulations.</p>
  </div>

  <div class="section signature-section">
    <div class="field"><label>Account Holder Signature:</label></div>
    <div class="signature-box"></div>
    <div class="field"><label>Date:</label><span>____________________</span></div>
  </div>
</body>
</html>
"#,
        reference = mandate.mandate_reference,
        bank_name = mandate.bank_name,
        branch_code = mandate.branch_code,
        account_holder = mandate.account_holder,
        account_number = mandate.account_number,
        account_type = mandate.account_type.as_str(),
        max_amount = mandate.max_amount,
        frequency = mandate.frequency.as_str(),
        start_date = mandate.start_date,
        end_date_row = end_date_row,
    )
}
