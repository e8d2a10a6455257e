mod applier_test;
