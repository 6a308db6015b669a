mod test_claims;
